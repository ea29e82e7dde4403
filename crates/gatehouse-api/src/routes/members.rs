//! # Member Routes
//!
//! The only member endpoint served here is `/api/members/me`. Login, signup
//! and the rest of the member surface live in the application behind the
//! gate; their paths appear on the default allow-list.

use axum::routing::get;
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::gate::CallerIdentity;
use crate::state::AppState;

/// The authenticated caller as seen by the API.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MeResponse {
    pub subject: String,
    pub roles: Vec<String>,
    pub email: Option<String>,
    pub nickname: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// `jti` of the presented token.
    pub token_id: String,
}

impl From<CallerIdentity> for MeResponse {
    fn from(CallerIdentity(id): CallerIdentity) -> Self {
        Self {
            subject: id.subject,
            roles: id.roles,
            email: id.email,
            nickname: id.nickname,
            issued_at: id.issued_at,
            expires_at: id.expires_at,
            token_id: id.token_id,
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new().route("/api/members/me", get(me))
}

/// GET /api/members/me: return the caller's identity.
#[utoipa::path(
    get,
    path = "/api/members/me",
    responses(
        (status = 200, description = "Authenticated caller", body = MeResponse),
        (status = 401, description = "Missing, invalid, or expired token", body = crate::error::ErrorBody),
    ),
    security(("bearer" = [])),
    tag = "members"
)]
pub(crate) async fn me(caller: CallerIdentity) -> Json<MeResponse> {
    Json(caller.into())
}
