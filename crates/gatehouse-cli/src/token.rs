//! # Token Subcommands
//!
//! `issue` mints an access token signed with the configured secret;
//! `verify` runs a token through the same verifier the server uses.

use anyhow::{Context, Result};
use clap::Args;

use gatehouse_core::config::check_ttl;
use gatehouse_core::{
    AuthError, Identity, SecurityConfig, SigningSecret, TokenIssuer, TokenVerifier,
};

use crate::EXIT_REJECTED;

/// Arguments for `gatehouse issue`.
#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Subject (`sub` claim) of the token.
    #[arg(long)]
    pub subject: String,

    /// Role to grant. Repeat for several roles.
    #[arg(long = "role", value_name = "ROLE")]
    pub roles: Vec<String>,

    /// Lifetime in seconds (default: `accessTokenTtlSeconds` from config).
    #[arg(long)]
    pub ttl_secs: Option<i64>,

    #[arg(long)]
    pub email: Option<String>,

    #[arg(long)]
    pub nickname: Option<String>,
}

/// Arguments for `gatehouse verify`.
#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// The bearer token, without the `Bearer ` prefix.
    #[arg(value_name = "TOKEN")]
    pub token: String,
}

/// Execute `gatehouse issue`: print the signed token.
pub fn run_issue(args: &IssueArgs, config: &SecurityConfig) -> Result<u8> {
    let secret = config.signing_secret()?;
    println!("{}", issue_token(args, config, &secret)?);
    Ok(0)
}

/// Execute `gatehouse verify`: print the identity, or the failure kind.
pub fn run_verify(args: &VerifyArgs, config: &SecurityConfig) -> Result<u8> {
    let secret = config.signing_secret()?;
    verify_and_report(&args.token, config, &secret)
}

fn verify_and_report(token: &str, config: &SecurityConfig, secret: &SigningSecret) -> Result<u8> {
    match verify_token(token, config, secret)? {
        Ok(identity) => {
            let json = serde_json::to_string_pretty(&identity)
                .context("failed to serialize identity")?;
            println!("{json}");
            Ok(0)
        }
        Err(err) => {
            println!("FAIL: {} ({err})", err.kind());
            Ok(EXIT_REJECTED)
        }
    }
}

fn issue_token(args: &IssueArgs, config: &SecurityConfig, secret: &SigningSecret) -> Result<String> {
    let mut settings = config.token.clone();
    if let Some(ttl) = args.ttl_secs {
        check_ttl(ttl).context("--ttl-secs out of range")?;
        settings.access_ttl_secs = ttl;
    }

    let issuer = TokenIssuer::new(secret, &settings)?;

    let mut claims = issuer.claims_for(args.subject.clone(), args.roles.clone());
    if let Some(email) = &args.email {
        claims = claims.with_email(email.clone());
    }
    if let Some(nickname) = &args.nickname {
        claims = claims.with_nickname(nickname.clone());
    }

    tracing::info!(subject = %claims.sub, exp = claims.exp, "issuing token");
    Ok(issuer.issue_claims(&claims)?)
}

/// Outer error: the verifier could not be built. Inner: the token was rejected.
fn verify_token(
    token: &str,
    config: &SecurityConfig,
    secret: &SigningSecret,
) -> Result<Result<Identity, AuthError>> {
    let verifier = TokenVerifier::new(secret, &config.token)?;
    Ok(verifier.verify(token.trim()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SigningSecret {
        SigningSecret::new("0123456789abcdef0123456789abcdef").unwrap()
    }

    fn issue_args(subject: &str) -> IssueArgs {
        IssueArgs {
            subject: subject.into(),
            roles: vec!["USER".into()],
            ttl_secs: None,
            email: Some("u@example.com".into()),
            nickname: None,
        }
    }

    #[test]
    fn issued_token_verifies() {
        let config = SecurityConfig::default();
        let token = issue_token(&issue_args("user1"), &config, &secret()).unwrap();
        let identity = verify_token(&token, &config, &secret()).unwrap().unwrap();
        assert_eq!(identity.subject, "user1");
        assert_eq!(identity.roles, vec!["USER".to_string()]);
        assert_eq!(identity.email.as_deref(), Some("u@example.com"));
    }

    #[test]
    fn ttl_override_applies() {
        let config = SecurityConfig::default();
        let args = IssueArgs {
            ttl_secs: Some(120),
            ..issue_args("user1")
        };
        let token = issue_token(&args, &config, &secret()).unwrap();
        let identity = verify_token(&token, &config, &secret()).unwrap().unwrap();
        assert_eq!((identity.expires_at - identity.issued_at).num_seconds(), 120);
    }

    #[test]
    fn out_of_range_ttl_rejected() {
        for ttl in [0, -5, i64::MAX] {
            let args = IssueArgs {
                ttl_secs: Some(ttl),
                ..issue_args("user1")
            };
            assert!(
                issue_token(&args, &SecurityConfig::default(), &secret()).is_err(),
                "ttl {ttl} should be rejected"
            );
        }
    }

    #[test]
    fn configured_non_positive_ttl_rejected() {
        let mut config = SecurityConfig::default();
        config.token.access_ttl_secs = -60;
        assert!(issue_token(&issue_args("user1"), &config, &secret()).is_err());
    }

    #[test]
    fn garbage_token_rejected_not_errored() {
        let outcome = verify_token("not-a-jwt", &SecurityConfig::default(), &secret()).unwrap();
        assert!(matches!(outcome, Err(AuthError::InvalidCredential(_))));
    }

    #[test]
    fn verify_exit_codes() {
        let config = SecurityConfig::default();
        let token = issue_token(&issue_args("user1"), &config, &secret()).unwrap();
        assert_eq!(verify_and_report(&token, &config, &secret()).unwrap(), 0);
        assert_eq!(
            verify_and_report("x.y.z", &config, &secret()).unwrap(),
            EXIT_REJECTED
        );
    }
}
