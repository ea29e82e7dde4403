//! Liveness check.

use axum::routing::get;
use axum::Router;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// GET /api/health: always `ok` while the process is serving.
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Process is alive", body = String),
    ),
    tag = "health"
)]
pub(crate) async fn health() -> &'static str {
    "ok"
}
