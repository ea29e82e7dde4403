//! # API Route Modules
//!
//! - `health`: liveness check, on the default allow-list.
//! - `members`: the caller's own identity (protected).
//! - `admin`: role-gated ping (protected, `ADMIN` only).

pub mod admin;
pub mod health;
pub mod members;
