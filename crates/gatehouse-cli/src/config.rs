//! # Config Subcommand
//!
//! Prints the effective security config as YAML (defaults filled in, the
//! signing secret omitted), or checks it the way the server does at startup.

use anyhow::{Context, Result};
use clap::Args;

use gatehouse_core::SecurityConfig;

/// Arguments for `gatehouse config`.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    /// Validate the config and resolve the signing secret instead of printing.
    #[arg(long)]
    pub check: bool,
}

/// Execute `gatehouse config`.
pub fn run_config(args: &ConfigArgs, config: &SecurityConfig) -> Result<u8> {
    if args.check {
        check(config)?;
        println!("OK: configuration valid");
        if config.cors.is_permissive() {
            println!("WARNING: CORS allows any origin with credentials");
        }
        return Ok(0);
    }

    let yaml = config.to_yaml().context("failed to serialize config")?;
    print!("{yaml}");
    Ok(0)
}

fn check(config: &SecurityConfig) -> Result<()> {
    check_policy(config)?;
    config
        .signing_secret()
        .context("signing secret unavailable")?;
    Ok(())
}

/// The same policy checks the server runs before building the gate.
fn check_policy(config: &SecurityConfig) -> Result<()> {
    config.validate().context("invalid configuration")
}
