//! # gatehouse CLI entry point
//!
//! Parses command-line arguments and dispatches to subcommand handlers.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use gatehouse_cli::config::{run_config, ConfigArgs};
use gatehouse_cli::path::{run_check_path, CheckPathArgs};
use gatehouse_cli::token::{run_issue, run_verify, IssueArgs, VerifyArgs};

/// gatehouse: token gate tooling
///
/// Issue and verify access tokens, classify request paths, and inspect the
/// security configuration the gate enforces.
#[derive(Parser, Debug)]
#[command(name = "gatehouse", version, about, long_about = None)]
struct Cli {
    /// Enable verbose output. Repeat for more verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to the security config file (default: $GATEHOUSE_CONFIG).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mint an access token signed with the configured secret.
    Issue(IssueArgs),

    /// Verify a token and print the caller identity.
    Verify(VerifyArgs),

    /// Classify a request path as public or protected.
    CheckPath(CheckPathArgs),

    /// Print or check the effective security configuration.
    Config(ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize tracing based on verbosity level.
    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let result = gatehouse_cli::load_config(cli.config.as_deref()).and_then(|config| {
        match &cli.command {
            Commands::Issue(args) => run_issue(args, &config),
            Commands::Verify(args) => run_verify(args, &config),
            Commands::CheckPath(args) => run_check_path(args, &config),
            Commands::Config(args) => run_config(args, &config),
        }
    });

    match result {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            eprintln!("error: {e:#}");
            ExitCode::from(1)
        }
    }
}
