//! # Security Gate Middleware
//!
//! Composes the path classifier and the token verifier into one decision
//! per request:
//!
//! ```text
//! Received → public?  ── yes ──────────────────────────────▶ Forwarded (no identity)
//!               │
//!               no → extract token → verify ── ok ────────▶ Forwarded (Identity)
//!                                     │
//!                                     └── missing/invalid/expired ─▶ Denied (401)
//! ```
//!
//! ## Token Sources
//!
//! The configured header (default `Authorization`) is consulted first and
//! must use the `Bearer` scheme. If it is absent, empty, or uses another
//! scheme, the fallback cookie (default `accessToken`) is tried.
//!
//! ## Identity
//!
//! On success the [`Identity`] is inserted into the request extensions.
//! Handlers obtain it through the [`CallerIdentity`] extractor.

use std::convert::Infallible;
use std::ops::Deref;
use std::sync::Arc;

use axum::extract::{FromRequestParts, OptionalFromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderName, Method};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum_extra::extract::cookie::CookieJar;
use gatehouse_core::{
    AuthError, ConfigError, Identity, PathClassifier, SecurityConfig, SigningSecret,
    TokenSettings, TokenVerifier,
};

use crate::error::AppError;

// ── TokenSource ─────────────────────────────────────────────────────────────

/// Where a credential was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    Header,
    Cookie,
}

impl CredentialSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Cookie => "cookie",
        }
    }
}

/// Locates the bearer token in request headers.
#[derive(Debug, Clone)]
pub struct TokenSource {
    header: HeaderName,
    cookie: Option<String>,
}

impl TokenSource {
    pub fn new(settings: &TokenSettings) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(settings.header_name.as_bytes())
            .map_err(|_| ConfigError::InvalidHeaderName(settings.header_name.clone()))?;
        Ok(Self {
            header,
            cookie: settings.cookie().map(str::to_owned),
        })
    }

    /// Find a candidate token. The header wins over the cookie.
    pub fn extract(&self, headers: &HeaderMap) -> Option<(String, CredentialSource)> {
        let from_header = headers
            .get(&self.header)
            .and_then(|v| v.to_str().ok())
            .and_then(bearer_token)
            .map(|t| (t.to_owned(), CredentialSource::Header));

        from_header.or_else(|| {
            let name = self.cookie.as_deref()?;
            let jar = CookieJar::from_headers(headers);
            let value = jar.get(name)?.value().trim();
            (!value.is_empty()).then(|| (value.to_owned(), CredentialSource::Cookie))
        })
    }
}

/// Parse `Bearer <token>`. The scheme is case-insensitive.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

// ── SecurityGate ────────────────────────────────────────────────────────────

/// Outcome of gating one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// On the allow-list; forwarded without an identity.
    Public,
    /// Token verified; forwarded with this identity.
    Authenticated(Identity),
    /// Rejected before reaching the handler.
    Denied(AuthError),
}

/// Immutable gate shared by all request tasks.
#[derive(Debug)]
pub struct SecurityGate {
    classifier: PathClassifier,
    verifier: TokenVerifier,
    source: TokenSource,
}

impl SecurityGate {
    /// Build the gate from a config and an already-resolved secret.
    pub fn new(config: &SecurityConfig, secret: &SigningSecret) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier: config.classifier()?,
            verifier: TokenVerifier::new(secret, &config.token)?,
            source: TokenSource::new(&config.token)?,
        })
    }

    /// Build the gate, resolving the secret from the environment or config.
    pub fn from_config(config: &SecurityConfig) -> Result<Self, ConfigError> {
        let secret = config.signing_secret()?;
        Self::new(config, &secret)
    }

    pub fn is_public(&self, path: &str, method: &Method) -> bool {
        self.classifier.is_public(path, method.as_str())
    }

    /// Extract and verify the request's token.
    pub fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let (token, source) = self
            .source
            .extract(headers)
            .ok_or(AuthError::MissingCredential)?;
        let identity = self.verifier.verify(&token)?;
        tracing::debug!(
            subject = %identity.subject,
            source = source.as_str(),
            "credential verified"
        );
        Ok(identity)
    }

    /// Classify, then authenticate protected requests.
    pub fn admit(&self, method: &Method, path: &str, headers: &HeaderMap) -> Admission {
        if self.is_public(path, method) {
            return Admission::Public;
        }
        match self.authenticate(headers) {
            Ok(identity) => Admission::Authenticated(identity),
            Err(err) => Admission::Denied(err),
        }
    }
}

// ── Middleware ──────────────────────────────────────────────────────────────

/// Gate every request through the [`SecurityGate`] found in the extensions.
///
/// Fails closed: if no gate was installed, the request is denied.
pub async fn security_middleware(mut request: Request, next: Next) -> Response {
    let Some(gate) = request.extensions().get::<Arc<SecurityGate>>().cloned() else {
        tracing::error!("security gate missing from request extensions; denying");
        return AppError::Unauthorized.into_response();
    };

    match gate.admit(request.method(), request.uri().path(), request.headers()) {
        Admission::Public => {
            tracing::debug!(path = %request.uri().path(), "public path");
            next.run(request).await
        }
        Admission::Authenticated(identity) => {
            request.extensions_mut().insert(identity);
            next.run(request).await
        }
        Admission::Denied(err) => {
            tracing::warn!(
                kind = err.kind(),
                method = %request.method(),
                path = %request.uri().path(),
                "authentication failed"
            );
            AppError::from(err).into_response()
        }
    }
}

// ── CallerIdentity ──────────────────────────────────────────────────────────

/// The identity the gate attached to this request.
///
/// Rejects with the generic 401 when the request carries no identity, which
/// is the case on public routes. Extract `Option<CallerIdentity>` on routes
/// that serve both anonymous and authenticated callers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity(pub Identity);

impl Deref for CallerIdentity {
    type Target = Identity;

    fn deref(&self) -> &Identity {
        &self.0
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CallerIdentity {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Identity>()
            .cloned()
            .map(CallerIdentity)
            .ok_or(AppError::Unauthorized)
    }
}

impl<S: Send + Sync> OptionalFromRequestParts<S> for CallerIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        _state: &S,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(parts.extensions.get::<Identity>().cloned().map(CallerIdentity))
    }
}

/// Check that the caller holds `role`. Returns 403 Forbidden otherwise.
pub fn require_role(caller: &Identity, role: &str) -> Result<(), AppError> {
    if caller.has_role(role) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("role '{role}' required")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, StatusCode};
    use axum::middleware::from_fn;
    use axum::routing::get;
    use axum::{Extension, Router};
    use gatehouse_core::{Claims, TokenIssuer};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    const SECRET: &str = "0123456789abcdef0123456789abcdef";

    fn config() -> SecurityConfig {
        SecurityConfig {
            public_paths: vec!["/login".into(), "/signup".into()],
            ..SecurityConfig::default()
        }
    }

    fn secret() -> SigningSecret {
        SigningSecret::new(SECRET).unwrap()
    }

    fn gate() -> SecurityGate {
        SecurityGate::new(&config(), &secret()).unwrap()
    }

    fn issuer() -> TokenIssuer {
        TokenIssuer::new(&secret(), &config().token).unwrap()
    }

    fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.append(
                HeaderName::from_bytes(k.as_bytes()).unwrap(),
                v.parse().unwrap(),
            );
        }
        map
    }

    /// Minimal router with the gate and a handler echoing the caller.
    fn test_app() -> Router {
        Router::new()
            .route("/login", get(|| async { "login" }))
            .route(
                "/profile",
                get(|caller: CallerIdentity| async move { caller.subject.clone() }),
            )
            .layer(from_fn(security_middleware))
            .layer(Extension(Arc::new(gate())))
    }

    // ── bearer parsing ───────────────────────────────────────────

    #[test]
    fn bearer_scheme_is_case_insensitive() {
        assert_eq!(bearer_token("Bearer abc"), Some("abc"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER  abc "), Some("abc"));
    }

    #[test]
    fn bearer_scheme_separated_by_tab() {
        assert_eq!(bearer_token("Bearer\tabc"), Some("abc"));
    }

    #[test]
    fn tab_separated_header_wins_over_cookie() {
        let source = TokenSource::new(&TokenSettings::default()).unwrap();
        let h = headers(&[
            ("authorization", "Bearer\tfrom-header"),
            ("cookie", "accessToken=from-cookie"),
        ]);
        assert_eq!(
            source.extract(&h),
            Some(("from-header".into(), CredentialSource::Header))
        );
    }

    #[test]
    fn non_bearer_or_empty_rejected() {
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer    "), None);
        assert_eq!(bearer_token("abc"), None);
    }

    // ── TokenSource ──────────────────────────────────────────────

    #[test]
    fn header_wins_over_cookie() {
        let source = TokenSource::new(&TokenSettings::default()).unwrap();
        let h = headers(&[
            ("authorization", "Bearer from-header"),
            ("cookie", "accessToken=from-cookie"),
        ]);
        assert_eq!(
            source.extract(&h),
            Some(("from-header".into(), CredentialSource::Header))
        );
    }

    #[test]
    fn cookie_used_when_header_absent() {
        let source = TokenSource::new(&TokenSettings::default()).unwrap();
        let h = headers(&[("cookie", "theme=dark; accessToken=from-cookie")]);
        assert_eq!(
            source.extract(&h),
            Some(("from-cookie".into(), CredentialSource::Cookie))
        );
    }

    #[test]
    fn cookie_used_when_header_not_bearer() {
        let source = TokenSource::new(&TokenSettings::default()).unwrap();
        let h = headers(&[
            ("authorization", "Basic dXNlcjpwYXNz"),
            ("cookie", "accessToken=from-cookie"),
        ]);
        assert_eq!(
            source.extract(&h).map(|(_, s)| s),
            Some(CredentialSource::Cookie)
        );
    }

    #[test]
    fn disabled_cookie_fallback_ignores_cookie() {
        let settings = TokenSettings {
            cookie_name: String::new(),
            ..TokenSettings::default()
        };
        let source = TokenSource::new(&settings).unwrap();
        let h = headers(&[("cookie", "accessToken=from-cookie")]);
        assert_eq!(source.extract(&h), None);
    }

    #[test]
    fn custom_header_name() {
        let settings = TokenSettings {
            header_name: "X-Auth-Token".into(),
            ..TokenSettings::default()
        };
        let source = TokenSource::new(&settings).unwrap();
        let h = headers(&[("x-auth-token", "Bearer t"), ("authorization", "Bearer other")]);
        assert_eq!(source.extract(&h).map(|(t, _)| t), Some("t".into()));
    }

    #[test]
    fn invalid_header_name_is_config_error() {
        let settings = TokenSettings {
            header_name: "bad header".into(),
            ..TokenSettings::default()
        };
        assert!(matches!(
            TokenSource::new(&settings),
            Err(ConfigError::InvalidHeaderName(_))
        ));
    }

    // ── SecurityGate::admit ──────────────────────────────────────

    #[test]
    fn public_path_admitted_regardless_of_token() {
        let g = gate();
        let garbage = headers(&[("authorization", "Bearer garbage")]);
        assert_eq!(g.admit(&Method::GET, "/login", &HeaderMap::new()), Admission::Public);
        assert_eq!(g.admit(&Method::POST, "/signup", &garbage), Admission::Public);
    }

    #[test]
    fn protected_path_without_token_denied() {
        assert_eq!(
            gate().admit(&Method::GET, "/profile", &HeaderMap::new()),
            Admission::Denied(AuthError::MissingCredential)
        );
    }

    #[test]
    fn protected_path_with_valid_token_authenticated() {
        let token = issuer().issue("user1", vec!["USER".into()]).unwrap();
        let h = headers(&[("authorization", &format!("Bearer {token}"))]);
        match gate().admit(&Method::GET, "/profile", &h) {
            Admission::Authenticated(id) => assert_eq!(id.subject, "user1"),
            other => panic!("expected Authenticated, got {other:?}"),
        }
    }

    #[test]
    fn protected_path_with_expired_token_denied_as_expired() {
        let mut claims = Claims::new("user1", vec![], 60);
        claims.exp = chrono::Utc::now().timestamp() - 120;
        let token = issuer().issue_claims(&claims).unwrap();
        let h = headers(&[("authorization", &format!("Bearer {token}"))]);
        assert_eq!(
            gate().admit(&Method::GET, "/profile", &h),
            Admission::Denied(AuthError::ExpiredCredential)
        );
    }

    #[test]
    fn missing_secret_is_config_error() {
        let cfg = SecurityConfig {
            signing_secret: None,
            ..config()
        };
        assert!(matches!(
            SigningSecret::resolve(None, cfg.signing_secret.as_deref()),
            Err(ConfigError::MissingSecret { .. })
        ));
    }

    #[test]
    fn file_secret_builds_gate() {
        let cfg = SecurityConfig {
            signing_secret: Some(SECRET.into()),
            ..config()
        };
        let secret = SigningSecret::resolve(None, cfg.signing_secret.as_deref()).unwrap();
        let g = SecurityGate::new(&cfg, &secret).unwrap();
        let token = issuer().issue("user1", vec![]).unwrap();
        let h = headers(&[("authorization", &format!("Bearer {token}"))]);
        assert!(g.authenticate(&h).is_ok());
    }

    // ── require_role ─────────────────────────────────────────────

    #[test]
    fn require_role_checks_membership() {
        let id = Identity::try_from(Claims::new("u", vec!["ADMIN".into()], 60)).unwrap();
        assert!(require_role(&id, "ADMIN").is_ok());
        assert!(matches!(
            require_role(&id, "AUDITOR"),
            Err(AppError::Forbidden(_))
        ));
    }

    // ── middleware ───────────────────────────────────────────────

    #[tokio::test]
    async fn middleware_forwards_public_route() {
        let response = test_app()
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn middleware_attaches_identity() {
        let token = issuer().issue("user1", vec![]).unwrap();
        let response = test_app()
            .oneshot(
                Request::builder()
                    .uri("/profile")
                    .header(header::AUTHORIZATION, format!("Bearer {token}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"user1");
    }

    #[tokio::test]
    async fn middleware_rejects_missing_token() {
        let response = test_app()
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn middleware_fails_closed_without_gate() {
        let app = Router::new()
            .route("/profile", get(|| async { "secret" }))
            .layer(from_fn(security_middleware));
        let response = app
            .oneshot(Request::builder().uri("/profile").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn caller_identity_rejected_on_public_route() {
        // A handler that demands an identity on an allow-listed path still
        // gets a 401: the gate forwards public requests without one.
        let app = Router::new()
            .route(
                "/login",
                get(|caller: CallerIdentity| async move { caller.subject.clone() }),
            )
            .layer(from_fn(security_middleware))
            .layer(Extension(Arc::new(gate())));
        let response = app
            .oneshot(Request::builder().uri("/login").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
