//! # Path Classification Subcommand
//!
//! Answers "would the gate let this request through without a token?"
//! using the configured allow-list.

use anyhow::Result;
use clap::Args;

use gatehouse_core::{PathClassifier, PublicPath, SecurityConfig};

/// Arguments for `gatehouse check-path`.
#[derive(Args, Debug)]
pub struct CheckPathArgs {
    /// Request path, e.g. `/api/members/login`. A query string is ignored.
    #[arg(value_name = "PATH")]
    pub path: String,

    /// HTTP method of the request.
    #[arg(long, short, default_value = "GET")]
    pub method: String,
}

/// Execute `gatehouse check-path`.
///
/// Prints `public` with the matching entry, or `protected`. Always exits 0
/// on a valid config; the answer is in the output.
pub fn run_check_path(args: &CheckPathArgs, config: &SecurityConfig) -> Result<u8> {
    let classifier = config.classifier()?;
    let method = args.method.to_ascii_uppercase();

    match matching_entry(&classifier, &args.path, &method) {
        Some(entry) => println!("public: {method} {} (matched '{entry}')", args.path),
        None => println!("protected: {method} {}", args.path),
    }
    Ok(0)
}

/// First allow-list entry admitting `(path, method)`, if any.
fn matching_entry<'a>(
    classifier: &'a PathClassifier,
    path: &str,
    method: &str,
) -> Option<&'a PublicPath> {
    if !classifier.is_public(path, method) {
        return None;
    }
    let path = path.split_once('?').map_or(path, |(p, _)| p);
    classifier.entries().iter().find(|e| e.matches(path, method))
}
