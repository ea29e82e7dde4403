//! # API Error Types
//!
//! Structured error type implementing `axum::response::IntoResponse`.
//! Returns JSON error bodies with a machine-readable code and a message.
//!
//! Authentication failures are uniform: every
//! [`AuthError`](gatehouse_core::AuthError) kind becomes the same 401 body,
//! so a client cannot tell a missing token from a forged or expired one.
//! The specific kind is only ever written to the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use gatehouse_core::AuthError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// The one message every 401 carries.
pub const UNAUTHENTICATED_MESSAGE: &str = "authentication required";

/// Structured JSON error response body.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

/// Inner error detail.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorDetail {
    /// Machine-readable error code (e.g. "UNAUTHORIZED", "FORBIDDEN").
    pub code: String,
    /// Human-readable error message.
    pub message: String,
}

/// Application-level error type that implements [`IntoResponse`] for Axum.
#[derive(Error, Debug)]
pub enum AppError {
    /// No verified identity (401). Carries no detail by construction.
    #[error("unauthorized")]
    Unauthorized,

    /// Authenticated but lacking a required role (403).
    #[error("forbidden: {0}")]
    Forbidden(String),
}

impl AppError {
    /// Return the HTTP status code and machine-readable error code for this error.
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            Self::Forbidden(_) => (StatusCode::FORBIDDEN, "FORBIDDEN"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let message = match &self {
            Self::Unauthorized => UNAUTHENTICATED_MESSAGE.to_string(),
            other => other.to_string(),
        };

        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Every credential failure collapses into the same 401.
impl From<AuthError> for AppError {
    fn from(_: AuthError) -> Self {
        Self::Unauthorized
    }
}
