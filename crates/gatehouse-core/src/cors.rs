//! # CORS Policy
//!
//! Declarative CORS settings. The policy is passed through to the HTTP
//! layer's CORS implementation; nothing here negotiates preflights. What
//! lives here is the string-level validation and origin pattern matching
//! that the HTTP layer needs when it translates the policy.
//!
//! The defaults reproduce the backend's permissive policy (any origin, with
//! credentials). That combination is a deliberate, documented trade-off
//! rather than a recommendation, and the server logs a warning for it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Wildcard marker accepted in origin, method, and header lists.
pub const WILDCARD: &str = "*";

/// CORS settings as they appear in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsPolicy {
    /// Exact origins, `*`, or glob patterns such as `https://*.example.com`.
    #[serde(rename = "corsAllowedOrigins")]
    pub allowed_origins: Vec<String>,
    #[serde(rename = "corsAllowedMethods")]
    pub allowed_methods: Vec<String>,
    #[serde(rename = "corsAllowedHeaders")]
    pub allowed_headers: Vec<String>,
    #[serde(rename = "corsAllowCredentials")]
    pub allow_credentials: bool,
    #[serde(rename = "corsExposedHeaders")]
    pub exposed_headers: Vec<String>,
    #[serde(rename = "corsMaxAgeSeconds")]
    pub max_age_secs: u64,
}

impl Default for CorsPolicy {
    fn default() -> Self {
        Self {
            allowed_origins: vec![WILDCARD.into()],
            allowed_methods: ["HEAD", "GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"]
                .iter()
                .map(|m| (*m).to_string())
                .collect(),
            allowed_headers: vec![WILDCARD.into()],
            allow_credentials: true,
            exposed_headers: vec!["Set-Cookie".into()],
            max_age_secs: 3600,
        }
    }
}

impl CorsPolicy {
    /// `*` appears in the origin list.
    pub fn any_origin(&self) -> bool {
        contains_wildcard(&self.allowed_origins)
    }

    /// `*` appears in the method list.
    pub fn any_method(&self) -> bool {
        contains_wildcard(&self.allowed_methods)
    }

    /// `*` appears in the allowed header list.
    pub fn any_header(&self) -> bool {
        contains_wildcard(&self.allowed_headers)
    }

    /// Some origin entry is a glob pattern rather than a literal origin.
    pub fn has_origin_patterns(&self) -> bool {
        self.allowed_origins
            .iter()
            .any(|o| o != WILDCARD && o.contains('*'))
    }

    /// Wildcard origins combined with credentials.
    pub fn is_permissive(&self) -> bool {
        self.any_origin() && self.allow_credentials
    }

    /// Check whether `origin` is allowed by any configured entry.
    pub fn origin_allowed(&self, origin: &str) -> bool {
        self.allowed_origins
            .iter()
            .any(|pattern| pattern == WILDCARD || glob_match(pattern, origin))
    }

    /// Reject combinations the HTTP layer cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allow_credentials && contains_wildcard(&self.exposed_headers) {
            return Err(ConfigError::InvalidCors(
                "exposed headers cannot be '*' when credentials are allowed".into(),
            ));
        }
        if let Some(bad) = self
            .allowed_origins
            .iter()
            .find(|o| o.as_str() != WILDCARD && !o.contains("://"))
        {
            return Err(ConfigError::InvalidCors(format!(
                "origin '{bad}' must include a scheme"
            )));
        }
        if let Some(bad) = self.allowed_origins.iter().find(|o| !is_header_value(o)) {
            return Err(ConfigError::InvalidCors(format!("invalid origin '{bad}'")));
        }
        if let Some(bad) = find_non_token(&self.allowed_methods) {
            return Err(ConfigError::InvalidCors(format!("invalid method '{bad}'")));
        }
        if let Some(bad) = find_non_token(&self.allowed_headers)
            .or_else(|| find_non_token(&self.exposed_headers))
        {
            return Err(ConfigError::InvalidCors(format!(
                "invalid header name '{bad}'"
            )));
        }
        Ok(())
    }
}

fn contains_wildcard(items: &[String]) -> bool {
    items.iter().any(|i| i == WILDCARD)
}

/// First entry that is neither `*` nor an HTTP token.
fn find_non_token(items: &[String]) -> Option<&String> {
    items.iter().find(|i| i.as_str() != WILDCARD && !is_http_token(i))
}

/// RFC 9110 `token`: the grammar of header names and method names.
pub(crate) fn is_http_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric()
                || matches!(
                    b,
                    b'!' | b'#' | b'$' | b'%' | b'&' | b'\'' | b'*' | b'+' | b'-' | b'.'
                        | b'^' | b'_' | b'`' | b'|' | b'~'
                )
        })
}

/// Bytes an HTTP header value may carry: no control characters except tab.
fn is_header_value(s: &str) -> bool {
    s.bytes().all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

/// Match `text` against `pattern` where `*` stands for any run of characters.
/// Comparison is ASCII case-insensitive, as origins are.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pattern = pattern.to_ascii_lowercase();
    let text = text.to_ascii_lowercase();

    let mut parts = pattern.split('*');
    let first = parts.next().unwrap_or("");
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };

    let tail: Vec<&str> = parts.collect();
    let Some((last, middle)) = tail.split_last() else {
        // No '*' at all: exact match.
        return rest.is_empty();
    };

    for part in middle {
        match rest.find(part) {
            Some(idx) => rest = &rest[idx + part.len()..],
            None => return false,
        }
    }
    rest.len() >= last.len() && rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_permissive_policy() {
        let p = CorsPolicy::default();
        assert!(p.any_origin());
        assert!(p.any_header());
        assert!(!p.any_method());
        assert!(p.allow_credentials);
        assert_eq!(p.allowed_methods.len(), 7);
        assert_eq!(p.exposed_headers, vec!["Set-Cookie".to_string()]);
        assert_eq!(p.max_age_secs, 3600);
        assert!(p.is_permissive());
        assert!(p.validate().is_ok());
    }

    #[test]
    fn wildcard_exposed_headers_with_credentials_rejected() {
        let p = CorsPolicy {
            exposed_headers: vec!["*".into()],
            ..CorsPolicy::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidCors(_))));
    }

    #[test]
    fn wildcard_exposed_headers_without_credentials_allowed() {
        let p = CorsPolicy {
            exposed_headers: vec!["*".into()],
            allow_credentials: false,
            ..CorsPolicy::default()
        };
        assert!(p.validate().is_ok());
    }

    #[test]
    fn invalid_method_rejected() {
        let p = CorsPolicy {
            allowed_methods: vec!["GET".into(), "GE T".into()],
            ..CorsPolicy::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidCors(m)) if m.contains("GE T")));
    }

    #[test]
    fn invalid_allowed_header_rejected() {
        let p = CorsPolicy {
            allowed_headers: vec!["bad header".into()],
            ..CorsPolicy::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidCors(_))));
    }

    #[test]
    fn invalid_exposed_header_rejected() {
        let p = CorsPolicy {
            exposed_headers: vec!["bad header".into()],
            ..CorsPolicy::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidCors(_))));
    }

    #[test]
    fn origin_with_control_character_rejected() {
        let p = CorsPolicy {
            allowed_origins: vec!["https://app.example.com\n".into()],
            ..CorsPolicy::default()
        };
        assert!(matches!(p.validate(), Err(ConfigError::InvalidCors(_))));
    }

    #[test]
    fn http_token_grammar() {
        assert!(is_http_token("X-Auth-Token"));
        assert!(is_http_token("PATCH"));
        assert!(!is_http_token(""));
        assert!(!is_http_token("a b"));
        assert!(!is_http_token("a:b"));
    }

    #[test]
    fn origin_without_scheme_rejected() {
        let p = CorsPolicy {
            allowed_origins: vec!["example.com".into()],
            ..CorsPolicy::default()
        };
        assert!(p.validate().is_err());
    }

    #[test]
    fn origin_patterns_detected() {
        let p = CorsPolicy {
            allowed_origins: vec!["https://*.example.com".into()],
            ..CorsPolicy::default()
        };
        assert!(p.has_origin_patterns());
        assert!(!p.any_origin());
        assert!(p.origin_allowed("https://app.example.com"));
        assert!(!p.origin_allowed("https://example.org"));
    }

    #[test]
    fn exact_origin_list() {
        let p = CorsPolicy {
            allowed_origins: vec!["http://localhost:5173".into()],
            ..CorsPolicy::default()
        };
        assert!(!p.has_origin_patterns());
        assert!(p.origin_allowed("http://localhost:5173"));
        assert!(!p.origin_allowed("http://localhost:3000"));
    }

    #[test]
    fn glob_exact_without_star() {
        assert!(glob_match("https://a.com", "https://a.com"));
        assert!(glob_match("https://a.com", "HTTPS://A.COM"));
        assert!(!glob_match("https://a.com", "https://a.com.evil"));
    }

    #[test]
    fn glob_prefix_suffix() {
        assert!(glob_match("https://*.example.com", "https://api.example.com"));
        assert!(!glob_match("https://*.example.com", "https://example.com"));
        assert!(!glob_match("https://*.example.com", "https://evil.com/.example.com.x"));
    }

    #[test]
    fn glob_multiple_stars() {
        assert!(glob_match("http://*:*", "http://localhost:8080"));
        assert!(!glob_match("http://*:*", "https://localhost:8080"));
    }

    #[test]
    fn glob_overlapping_suffix_not_double_counted() {
        // "ab*ba" must not accept "aba" by reusing the shared 'a'.
        assert!(!glob_match("ab*ba", "aba"));
        assert!(glob_match("ab*ba", "abba"));
    }
}
