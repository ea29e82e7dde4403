//! # gatehouse-cli: CLI Tool for gatehouse
//!
//! Provides the `gatehouse` command-line interface for operating the gate
//! outside a running server.
//!
//! ## Subcommands
//!
//! - `gatehouse issue`: mint an access token with the configured secret.
//! - `gatehouse verify`: verify a token and print the resulting identity.
//! - `gatehouse check-path`: classify a request path as public or protected.
//! - `gatehouse config`: print or check the effective security config.
//!
//! Every subcommand reads the same YAML file the server does (`--config`,
//! falling back to `GATEHOUSE_CONFIG`), and the signing secret from
//! `GATEHOUSE_SIGNING_SECRET` when set.
//!
//! ```bash
//! gatehouse issue --subject user1 --role USER
//! gatehouse verify "$TOKEN"
//! gatehouse check-path /api/members/login --method POST
//! ```

pub mod config;
pub mod path;
pub mod token;

use std::path::Path;

use anyhow::{Context, Result};
use gatehouse_core::SecurityConfig;

/// Exit code for a completed check whose answer is negative (e.g. a
/// rejected token), as opposed to 1 for an operational error.
pub const EXIT_REJECTED: u8 = 2;

/// Load the security config from `path`, or from the environment when no
/// path is given.
pub fn load_config(path: Option<&Path>) -> Result<SecurityConfig> {
    match path {
        Some(p) => SecurityConfig::load(p)
            .with_context(|| format!("failed to load config: {}", p.display())),
        None => SecurityConfig::from_env().context("failed to load config from environment"),
    }
}
