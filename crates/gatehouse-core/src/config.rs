//! # Security Configuration
//!
//! One immutable value built at startup and shared by reference with the
//! path classifier, the token gate, and the CORS layer. Loaded from an
//! optional YAML file; every key has a default.
//!
//! ```yaml
//! publicPaths:
//!   - /api/members/login
//!   - GET /api/health
//! corsAllowedOrigins: ["https://app.example.com"]
//! corsAllowCredentials: true
//! tokenHeaderName: Authorization
//! tokenCookieName: accessToken
//! tokenLeewaySeconds: 0
//! ```
//!
//! The signing secret may also live in the file (`signingSecret`), but
//! [`SIGNING_SECRET_ENV`](crate::secret::SIGNING_SECRET_ENV) wins when set.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use jsonwebtoken::Algorithm;
use serde::{Deserialize, Serialize};

use crate::cors::{is_http_token, CorsPolicy};
use crate::error::ConfigError;
use crate::path::{PathClassifier, DEFAULT_PUBLIC_PATHS};
use crate::secret::SigningSecret;

/// Environment variable naming the YAML config file.
pub const CONFIG_PATH_ENV: &str = "GATEHOUSE_CONFIG";

/// Longest accepted access token lifetime (ten years).
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 3600;

// ── TokenSettings ───────────────────────────────────────────────────────────

/// Where tokens are found and how they are verified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenSettings {
    /// Header carrying `Bearer <token>`.
    #[serde(rename = "tokenHeaderName")]
    pub header_name: String,
    /// Fallback cookie. Empty disables the fallback.
    #[serde(rename = "tokenCookieName")]
    pub cookie_name: String,
    /// One of `HS256`, `HS384`, `HS512`.
    #[serde(rename = "tokenAlgorithm")]
    pub algorithm: String,
    /// Clock skew tolerated on `exp`.
    #[serde(rename = "tokenLeewaySeconds")]
    pub leeway_secs: u64,
    /// Required `iss` claim, if any.
    #[serde(rename = "tokenIssuer", skip_serializing_if = "Option::is_none")]
    pub issuer: Option<String>,
    #[serde(rename = "accessTokenTtlSeconds")]
    pub access_ttl_secs: i64,
}

impl Default for TokenSettings {
    fn default() -> Self {
        Self {
            header_name: "Authorization".into(),
            cookie_name: "accessToken".into(),
            algorithm: "HS256".into(),
            leeway_secs: 0,
            issuer: None,
            access_ttl_secs: 3600,
        }
    }
}

impl TokenSettings {
    /// Parse the configured algorithm, accepting only HMAC variants.
    pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
        let unsupported = || ConfigError::UnsupportedAlgorithm(self.algorithm.clone());
        let alg = Algorithm::from_str(&self.algorithm.to_ascii_uppercase())
            .map_err(|_| unsupported())?;
        match alg {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(alg),
            _ => Err(unsupported()),
        }
    }

    /// The fallback cookie name, if the fallback is enabled.
    pub fn cookie(&self) -> Option<&str> {
        Some(self.cookie_name.as_str()).filter(|c| !c.is_empty())
    }

    /// Reject settings the gate or the issuer could not use.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.algorithm()?;
        if !is_http_token(&self.header_name) {
            return Err(ConfigError::InvalidHeaderName(self.header_name.clone()));
        }
        check_ttl(self.access_ttl_secs)
    }
}

/// A token lifetime must be positive and at most [`MAX_TTL_SECS`].
pub fn check_ttl(ttl_secs: i64) -> Result<(), ConfigError> {
    if (1..=MAX_TTL_SECS).contains(&ttl_secs) {
        Ok(())
    } else {
        Err(ConfigError::InvalidTtl(ttl_secs))
    }
}

// ── SecurityConfig ──────────────────────────────────────────────────────────

/// The full security policy.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    #[serde(rename = "publicPaths")]
    pub public_paths: Vec<String>,
    #[serde(flatten)]
    pub cors: CorsPolicy,
    #[serde(flatten)]
    pub token: TokenSettings,
    #[serde(rename = "signingSecret", skip_serializing)]
    pub signing_secret: Option<String>,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            public_paths: DEFAULT_PUBLIC_PATHS.iter().map(|p| (*p).to_string()).collect(),
            cors: CorsPolicy::default(),
            token: TokenSettings::default(),
            signing_secret: None,
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("public_paths", &self.public_paths)
            .field("cors", &self.cors)
            .field("token", &self.token)
            .field(
                "signing_secret",
                &self.signing_secret.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

impl SecurityConfig {
    /// Parse YAML. An empty document yields the defaults.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Read and parse a YAML file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&raw)?;
        tracing::info!(path = %path.display(), "loaded security config");
        Ok(config)
    }

    /// Load from [`CONFIG_PATH_ENV`] when set, otherwise use the defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) if !path.is_empty() => Self::load(Path::new(&path)),
            _ => {
                tracing::info!("{CONFIG_PATH_ENV} not set, using default security config");
                Ok(Self::default())
            }
        }
    }

    /// Build the public path classifier.
    pub fn classifier(&self) -> Result<PathClassifier, ConfigError> {
        PathClassifier::new(&self.public_paths)
    }

    /// Resolve the signing secret (environment first, then file).
    pub fn signing_secret(&self) -> Result<SigningSecret, ConfigError> {
        SigningSecret::from_env_or(self.signing_secret.as_deref())
    }

    /// Check everything that can be checked without the HTTP layer.
    ///
    /// Does not resolve the secret; see [`Self::signing_secret`].
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier()?;
        self.cors.validate()?;
        self.token.validate()?;
        Ok(())
    }

    /// Serialize the effective config. The signing secret is never emitted.
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }
}
