//! # Signing Secret
//!
//! The HMAC key shared by [`TokenVerifier`](crate::token::TokenVerifier) and
//! [`TokenIssuer`](crate::token::TokenIssuer). Loaded once at startup and
//! read-only afterwards. The bytes are zeroized on drop and never printed.

use std::fmt;

use zeroize::Zeroizing;

use crate::error::ConfigError;

/// Environment variable consulted before the config file.
pub const SIGNING_SECRET_ENV: &str = "GATEHOUSE_SIGNING_SECRET";

/// Minimum HMAC key length (256 bits).
pub const MIN_SECRET_LEN: usize = 32;

/// HMAC key material.
#[derive(Clone)]
pub struct SigningSecret {
    bytes: Zeroizing<Vec<u8>>,
}

impl SigningSecret {
    /// Wrap raw key bytes, rejecting keys shorter than [`MIN_SECRET_LEN`].
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let bytes = Zeroizing::new(bytes.into());
        if bytes.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: bytes.len(),
            });
        }
        Ok(Self { bytes })
    }

    /// Resolve the secret: the environment variable wins over the file value.
    ///
    /// Absence of both is a startup fault.
    pub fn resolve(env_value: Option<String>, file_value: Option<&str>) -> Result<Self, ConfigError> {
        let env_value = env_value.map(Zeroizing::new);
        let chosen: Option<&str> = env_value
            .as_ref()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
            .or(file_value.filter(|s| !s.is_empty()));

        match chosen {
            Some(secret) => Self::new(secret.as_bytes()),
            None => Err(ConfigError::MissingSecret {
                env_var: SIGNING_SECRET_ENV.to_string(),
            }),
        }
    }

    /// Resolve using [`SIGNING_SECRET_ENV`] from the process environment.
    pub fn from_env_or(file_value: Option<&str>) -> Result<Self, ConfigError> {
        Self::resolve(std::env::var(SIGNING_SECRET_ENV).ok(), file_value)
    }

    pub(crate) fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningSecret")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}
