//! # Gate Error Types
//!
//! Two families of error live here:
//!
//! - [`AuthError`]: per-request credential failures. These are terminal for
//!   the request but never fatal for the process. The HTTP boundary collapses
//!   every variant into a single generic 401 so callers cannot tell which
//!   check failed.
//! - [`ConfigError`]: startup faults (missing or weak signing secret, bad
//!   allow-list pattern, bad CORS entry, unreadable config). The server
//!   refuses to start rather than rejecting every request at runtime.

use thiserror::Error;

/// A credential check failed for one request.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No token in the configured header or the fallback cookie.
    #[error("missing credential")]
    MissingCredential,

    /// The token is malformed, signed with another key, uses an unexpected
    /// algorithm or issuer, or lacks a required claim.
    #[error("invalid credential: {0}")]
    InvalidCredential(String),

    /// The signature is valid but the embedded expiry has passed.
    #[error("expired credential")]
    ExpiredCredential,
}

impl AuthError {
    /// Stable, low-cardinality name of the failure kind for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCredential => "missing_credential",
            Self::InvalidCredential(_) => "invalid_credential",
            Self::ExpiredCredential => "expired_credential",
        }
    }
}

/// Signing a token failed.
#[derive(Error, Debug)]
#[error("token signing failed: {0}")]
pub struct IssueError(#[from] pub jsonwebtoken::errors::Error);

/// Misconfiguration detected while building the gate.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No signing secret in the environment or the config file.
    #[error("signing secret not configured (set {env_var} or signingSecret)")]
    MissingSecret { env_var: String },

    /// The signing secret is shorter than the HMAC minimum.
    #[error("signing secret too short: expected at least {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },

    /// An allow-list entry could not be parsed.
    #[error("invalid public path entry '{entry}': {reason}")]
    InvalidPublicPath { entry: String, reason: String },

    /// A CORS policy entry is unusable.
    #[error("invalid CORS policy: {0}")]
    InvalidCors(String),

    /// The configured token algorithm is not an HMAC algorithm we support.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// The access token lifetime is not a positive number of seconds within
    /// [`MAX_TTL_SECS`](crate::config::MAX_TTL_SECS).
    #[error("invalid token TTL: {0} seconds")]
    InvalidTtl(i64),

    /// The token header name is not a valid HTTP header name.
    #[error("invalid token header name: {0}")]
    InvalidHeaderName(String),

    /// The config file could not be parsed.
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// The config file could not be read.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
