//! # gatehouse-api: Binary Entry Point
//!
//! Starts the demo server behind the security gate.
//! Binds to `PORT` (default 8080). Refuses to start on any configuration
//! fault, including a missing or weak signing secret.

use gatehouse_api::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured tracing.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env().map_err(|e| {
        tracing::error!("Configuration load failed: {e}");
        e
    })?;

    let state = AppState::from_config(config.security).map_err(|e| {
        tracing::error!("Security gate setup failed: {e}");
        e
    })?;
    tracing::info!(
        public_paths = state.config.public_paths.len(),
        "security gate ready"
    );

    let app = gatehouse_api::app(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("gatehouse API listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
