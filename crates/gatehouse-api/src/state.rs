//! # Application State
//!
//! Everything here is built once at startup and read-only afterwards, so
//! cloning the state is cheap.

use std::sync::Arc;

use gatehouse_core::{ConfigError, SecurityConfig, SigningSecret};
use tower_http::cors::CorsLayer;

use crate::cors::cors_layer;
use crate::gate::SecurityGate;

/// Default listen port when `PORT` is unset or unparsable.
pub const DEFAULT_PORT: u16 = 8080;

/// Process-level configuration for the demo server.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// Read `PORT` and the security config file named by `GATEHOUSE_CONFIG`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = std::env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);
        Ok(Self {
            port,
            security: SecurityConfig::from_env()?,
        })
    }
}

/// Shared application state.
#[derive(Debug, Clone)]
pub struct AppState {
    pub gate: Arc<SecurityGate>,
    pub config: Arc<SecurityConfig>,
    pub cors: CorsLayer,
}

impl AppState {
    /// Validate `config` and build the gate with an explicit secret.
    pub fn new(config: SecurityConfig, secret: &SigningSecret) -> Result<Self, ConfigError> {
        config.validate()?;
        let gate = SecurityGate::new(&config, secret)?;
        let cors = cors_layer(&config.cors)?;
        if config.cors.is_permissive() {
            tracing::warn!(
                "CORS allows any origin with credentials; every site can make credentialed requests"
            );
        }
        Ok(Self {
            gate: Arc::new(gate),
            config: Arc::new(config),
            cors,
        })
    }

    /// Validate `config` and build the gate, resolving the secret from the
    /// environment or the config file.
    pub fn from_config(config: SecurityConfig) -> Result<Self, ConfigError> {
        let secret = config.signing_secret()?;
        Self::new(config, &secret)
    }
}
