//! # Token Verification and Issuance
//!
//! HMAC-signed JWTs. Verification is a pure in-memory computation over key
//! material that is fixed at startup, so a single [`TokenVerifier`] can be
//! shared across all request tasks without locking.
//!
//! ## Check Order
//!
//! 1. Header algorithm must be the configured one.
//! 2. Signature must verify under the signing secret.
//! 3. Required claims (`exp`, `sub`, plus `iss` when an issuer is configured)
//!    must be present, `iss` must match when configured, and `exp` must not
//!    have passed (minus leeway).
//!
//! Because the signature is checked first, an expired token signed with a
//! foreign key is reported as invalid, not expired.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::claims::{Claims, Identity};
use crate::config::{check_ttl, TokenSettings};
use crate::error::{AuthError, ConfigError, IssueError};
use crate::secret::SigningSecret;

// ── TokenVerifier ───────────────────────────────────────────────────────────

/// Verifies bearer tokens and converts their claims into an [`Identity`].
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier. Fails only on an unsupported algorithm.
    pub fn new(secret: &SigningSecret, settings: &TokenSettings) -> Result<Self, ConfigError> {
        let mut validation = Validation::new(settings.algorithm()?);
        validation.leeway = settings.leeway_secs;
        match &settings.issuer {
            Some(issuer) => {
                // `set_issuer` alone accepts tokens that omit `iss`.
                validation.set_required_spec_claims(&["exp", "sub", "iss"]);
                validation.set_issuer(&[issuer]);
            }
            None => validation.set_required_spec_claims(&["exp", "sub"]),
        }

        Ok(Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        })
    }

    /// Verify `token` and return the caller's identity.
    pub fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let data = decode::<Claims>(token, &self.key, &self.validation).map_err(|err| {
            match err.kind() {
                ErrorKind::ExpiredSignature => AuthError::ExpiredCredential,
                _ => AuthError::InvalidCredential(err.to_string()),
            }
        })?;
        Identity::try_from(data.claims)
    }
}

impl std::fmt::Debug for TokenVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenVerifier")
            .field("algorithms", &self.validation.algorithms)
            .field("leeway", &self.validation.leeway)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

// ── TokenIssuer ─────────────────────────────────────────────────────────────

/// Mints tokens the verifier accepts. Used by tooling and tests; the gate
/// itself never issues tokens.
pub struct TokenIssuer {
    key: EncodingKey,
    algorithm: Algorithm,
    ttl_secs: i64,
    issuer: Option<String>,
}

impl TokenIssuer {
    /// Fails on an unsupported algorithm or a TTL outside `1..=MAX_TTL_SECS`.
    pub fn new(secret: &SigningSecret, settings: &TokenSettings) -> Result<Self, ConfigError> {
        check_ttl(settings.access_ttl_secs)?;
        Ok(Self {
            key: EncodingKey::from_secret(secret.as_bytes()),
            algorithm: settings.algorithm()?,
            ttl_secs: settings.access_ttl_secs,
            issuer: settings.issuer.clone(),
        })
    }

    /// Claims for `subject` with the configured TTL and issuer.
    pub fn claims_for(&self, subject: impl Into<String>, roles: Vec<String>) -> Claims {
        let claims = Claims::new(subject, roles, self.ttl_secs);
        match &self.issuer {
            Some(iss) => claims.with_issuer(iss.clone()),
            None => claims,
        }
    }

    /// Issue an access token for `subject`.
    pub fn issue(&self, subject: impl Into<String>, roles: Vec<String>) -> Result<String, IssueError> {
        self.issue_claims(&self.claims_for(subject, roles))
    }

    /// Sign arbitrary claims as-is.
    pub fn issue_claims(&self, claims: &Claims) -> Result<String, IssueError> {
        Ok(encode(&Header::new(self.algorithm), claims, &self.key)?)
    }
}

impl std::fmt::Debug for TokenIssuer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIssuer")
            .field("algorithm", &self.algorithm)
            .field("ttl_secs", &self.ttl_secs)
            .field("issuer", &self.issuer)
            .field("key", &"[REDACTED]")
            .finish()
    }
}
