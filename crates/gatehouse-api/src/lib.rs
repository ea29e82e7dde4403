//! # gatehouse-api: Axum Security Gate
//!
//! Wires the `gatehouse-core` primitives into an axum middleware stack and
//! serves a small demo surface behind it.
//!
//! ## API Surface
//!
//! | Path                | Module                  | Access          |
//! |---------------------|-------------------------|-----------------|
//! | `/api/health`       | [`routes::health`]      | public (default allow-list) |
//! | `/api/members/me`   | [`routes::members`]     | bearer token    |
//! | `/api/admin/ping`   | [`routes::admin`]       | bearer token + `ADMIN` |
//! | `/openapi.json`     | [`openapi`]             | bearer token unless allow-listed |
//!
//! ## Middleware Stack (execution order)
//!
//! ```text
//! CorsLayer → TraceLayer → Extension(gate) → security_middleware → Handler
//! ```
//!
//! CORS is outermost so preflight requests are answered before the gate.
//! Requests that match no route still pass through the gate, so an unknown
//! protected path yields 401 rather than 404.

pub mod cors;
pub mod error;
pub mod gate;
pub mod openapi;
pub mod routes;
pub mod state;

use axum::middleware::from_fn;
use axum::{Extension, Router};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Assemble the full application router with all routes and middleware.
pub fn app(state: AppState) -> Router {
    let routes = Router::new()
        .merge(routes::health::router())
        .merge(routes::members::router())
        .merge(routes::admin::router())
        .merge(openapi::router())
        .with_state(state.clone());

    secure(routes, &state)
}

/// Put any router behind the gate, with the same layer order as [`app`].
pub fn secure<S>(router: Router<S>, state: &AppState) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn(gate::security_middleware))
        .layer(Extension(state.gate.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(state.cors.clone())
}
