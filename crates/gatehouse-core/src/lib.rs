//! # gatehouse-core: Request Gate Primitives
//!
//! Framework-independent building blocks for a stateless authentication
//! gate in front of an HTTP API:
//!
//! - **Path classification** ([`path`]): which `(path, method)` pairs are on
//!   the public allow-list and bypass authentication.
//! - **Token verification** ([`token`]): HMAC-signed JWT verification into
//!   an [`Identity`], plus an issuer for tooling and tests.
//! - **Configuration** ([`config`], [`cors`], [`secret`]): the immutable
//!   security policy loaded once at startup.
//!
//! Nothing here knows about HTTP types; `gatehouse-api` wires these pieces
//! into an axum middleware stack.

pub mod claims;
pub mod config;
pub mod cors;
pub mod error;
pub mod path;
pub mod secret;
pub mod token;

// Re-export primary types.
pub use claims::{Claims, Identity};
pub use config::{SecurityConfig, TokenSettings};
pub use cors::CorsPolicy;
pub use error::{AuthError, ConfigError, IssueError};
pub use path::{PathClassifier, PathPattern, PublicPath};
pub use secret::SigningSecret;
pub use token::{TokenIssuer, TokenVerifier};
