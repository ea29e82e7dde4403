//! # Token Claims and Authenticated Identity
//!
//! [`Claims`] is the signed JWT payload. [`Identity`] is what the gate hands
//! to downstream handlers once the claims have been verified. An identity is
//! scoped to a single request and never shared across requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// JWT payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (member id).
    pub sub: String,
    /// Role names granted to the subject.
    #[serde(default)]
    pub roles: Vec<String>,
    /// Issued-at, seconds since the Unix epoch.
    pub iat: i64,
    /// Expiry, seconds since the Unix epoch.
    pub exp: i64,
    /// Unique token id.
    pub jti: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

impl Claims {
    /// Fresh claims for `sub` valid for `ttl_secs` from now. The expiry
    /// saturates instead of overflowing; callers bound the TTL with
    /// [`TokenSettings::validate`](crate::config::TokenSettings::validate).
    pub fn new(sub: impl Into<String>, roles: Vec<String>, ttl_secs: i64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: sub.into(),
            roles,
            iat: now,
            exp: now.saturating_add(ttl_secs),
            jti: uuid::Uuid::new_v4().to_string(),
            iss: None,
            email: None,
            nickname: None,
        }
    }

    pub fn with_issuer(mut self, iss: impl Into<String>) -> Self {
        self.iss = Some(iss.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_nickname(mut self, nickname: impl Into<String>) -> Self {
        self.nickname = Some(nickname.into());
        self
    }
}

/// The authenticated caller, derived from verified claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub subject: String,
    pub roles: Vec<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub token_id: String,
    pub email: Option<String>,
    pub nickname: Option<String>,
}

impl Identity {
    /// Check whether the caller holds `role` (exact, case-sensitive match).
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

impl TryFrom<Claims> for Identity {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        let timestamp = |secs: i64, name: &str| {
            DateTime::<Utc>::from_timestamp(secs, 0)
                .ok_or_else(|| AuthError::InvalidCredential(format!("{name} out of range")))
        };
        if claims.sub.is_empty() {
            return Err(AuthError::InvalidCredential("empty subject".into()));
        }

        Ok(Self {
            issued_at: timestamp(claims.iat, "iat")?,
            expires_at: timestamp(claims.exp, "exp")?,
            subject: claims.sub,
            roles: claims.roles,
            token_id: claims.jti,
            email: claims.email,
            nickname: claims.nickname,
        })
    }
}
