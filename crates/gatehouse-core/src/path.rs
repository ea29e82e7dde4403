//! # Public Path Classification
//!
//! Decides whether a request bypasses authentication. The allow-list is
//! parsed once at startup into [`PublicPath`] entries; classification is a
//! pure scan where any matching entry wins.
//!
//! ## Entry Syntax
//!
//! ```text
//! /api/health           : exact path, any method
//! GET /api/health       : exact path, GET only
//! /api/docs/**          : /api/docs and everything below it
//! /api/files/*          : exactly one segment below /api/files
//! ```
//!
//! Matching is literal: `/login/` does not match an entry for `/login`.

use std::fmt;

use crate::error::ConfigError;

/// The backend's original public endpoints.
pub const DEFAULT_PUBLIC_PATHS: &[&str] = &[
    "/api/members/login",
    "/api/members/signup",
    "/api/members/multipart",
    "/api/members/check-email",
    "/api/members/check-nickname",
    "/api/members/search-nickname",
    "/api/members/reset-password",
    "/api/members/refresh",
    "/api/members/logout",
    "/api/members/test-cookies",
    "/api/members/recommended-calories",
    "/api/health",
];

// ── PathPattern ─────────────────────────────────────────────────────────────

/// A path pattern with an optional trailing wildcard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPattern {
    /// Matches exactly this path.
    Exact(String),
    /// `prefix/**`: matches `prefix` itself and any path below it.
    Subtree(String),
    /// `prefix/*`: matches exactly one non-empty segment below `prefix`.
    Segment(String),
}

impl PathPattern {
    /// Parse a pattern. Wildcards are only accepted as a trailing `/*` or `/**`.
    pub fn parse(raw: &str) -> Result<Self, String> {
        if !raw.starts_with('/') {
            return Err("pattern must start with '/'".into());
        }

        let (pattern, prefix) = if let Some(prefix) = raw.strip_suffix("/**") {
            (Self::Subtree(prefix.to_string()), prefix)
        } else if let Some(prefix) = raw.strip_suffix("/*") {
            (Self::Segment(prefix.to_string()), prefix)
        } else {
            (Self::Exact(raw.to_string()), raw)
        };

        if prefix.contains('*') {
            return Err("wildcards are only allowed as a trailing '/*' or '/**'".into());
        }
        Ok(pattern)
    }

    /// Check whether `path` matches this pattern.
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::Exact(exact) => path == exact,
            Self::Subtree(prefix) => match path.strip_prefix(prefix.as_str()) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            },
            Self::Segment(prefix) => path
                .strip_prefix(prefix.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .is_some_and(|segment| !segment.is_empty() && !segment.contains('/')),
        }
    }
}

impl fmt::Display for PathPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact(p) => write!(f, "{p}"),
            Self::Subtree(p) => write!(f, "{p}/**"),
            Self::Segment(p) => write!(f, "{p}/*"),
        }
    }
}

// ── PublicPath ──────────────────────────────────────────────────────────────

/// One allow-list entry: an optional method restriction plus a pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicPath {
    /// Upper-cased method, or `None` for any method.
    pub method: Option<String>,
    pub pattern: PathPattern,
}

impl PublicPath {
    /// Parse `"<PATTERN>"` or `"<METHOD> <PATTERN>"`.
    pub fn parse(entry: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidPublicPath {
            entry: entry.to_string(),
            reason,
        };

        let trimmed = entry.trim();
        let (method, raw_pattern) = match trimmed.split_once(char::is_whitespace) {
            Some((method, rest)) if !method.starts_with('/') => {
                if !method.bytes().all(|b| b.is_ascii_alphabetic()) {
                    return Err(invalid(format!("invalid method '{method}'")));
                }
                (Some(method.to_ascii_uppercase()), rest.trim())
            }
            _ => (None, trimmed),
        };

        let pattern = PathPattern::parse(raw_pattern).map_err(invalid)?;
        Ok(Self { method, pattern })
    }

    /// Check whether a request with this path and method matches the entry.
    pub fn matches(&self, path: &str, method: &str) -> bool {
        let method_ok = self
            .method
            .as_deref()
            .map_or(true, |m| m.eq_ignore_ascii_case(method));
        method_ok && self.pattern.matches(path)
    }
}

impl fmt::Display for PublicPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.method {
            Some(method) => write!(f, "{method} {}", self.pattern),
            None => write!(f, "{}", self.pattern),
        }
    }
}

// ── PathClassifier ──────────────────────────────────────────────────────────

/// Immutable allow-list built once at startup.
#[derive(Debug, Clone, Default)]
pub struct PathClassifier {
    entries: Vec<PublicPath>,
}

impl PathClassifier {
    /// Parse every entry. The first malformed entry aborts construction.
    pub fn new<I, S>(entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let entries = entries
            .into_iter()
            .map(|e| PublicPath::parse(e.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// Classifier over [`DEFAULT_PUBLIC_PATHS`].
    pub fn with_defaults() -> Self {
        Self {
            entries: DEFAULT_PUBLIC_PATHS
                .iter()
                .map(|p| PublicPath {
                    method: None,
                    pattern: PathPattern::Exact((*p).to_string()),
                })
                .collect(),
        }
    }

    /// Whether the request bypasses authentication. Any query string is ignored.
    pub fn is_public(&self, path: &str, method: &str) -> bool {
        let path = path.split('?').next().unwrap_or(path);
        self.entries.iter().any(|entry| entry.matches(path, method))
    }

    /// The parsed allow-list.
    pub fn entries(&self) -> &[PublicPath] {
        &self.entries
    }
}
