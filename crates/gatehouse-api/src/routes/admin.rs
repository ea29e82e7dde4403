//! Role-gated endpoints.

use axum::routing::get;
use axum::Router;

use crate::error::AppError;
use crate::gate::{require_role, CallerIdentity};
use crate::state::AppState;

/// Role required for everything under `/api/admin`.
pub const ADMIN_ROLE: &str = "ADMIN";

pub fn router() -> Router<AppState> {
    Router::new().route("/api/admin/ping", get(ping))
}

/// GET /api/admin/ping
#[utoipa::path(
    get,
    path = "/api/admin/ping",
    responses(
        (status = 200, description = "Caller holds the ADMIN role", body = String),
        (status = 401, description = "Missing, invalid, or expired token", body = crate::error::ErrorBody),
        (status = 403, description = "Caller lacks the ADMIN role", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "admin"
)]
pub(crate) async fn ping(caller: CallerIdentity) -> Result<&'static str, AppError> {
    require_role(&caller, ADMIN_ROLE)?;
    tracing::info!(subject = %caller.subject, "admin ping");
    Ok("pong")
}
