//! # CORS Layer
//!
//! Translates a [`CorsPolicy`] into a `tower_http` [`CorsLayer`].
//!
//! Browsers reject `Access-Control-Allow-Origin: *` on credentialed
//! requests, and `tower_http` panics when a wildcard is combined with
//! `allow_credentials(true)`. A `*` entry together with credentials is
//! therefore served by mirroring the request's origin, method list, or
//! header list back to the client.
//!
//! The layer sits outside the security middleware, so preflight requests
//! are answered here and never reach the gate.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method};
use gatehouse_core::cors::WILDCARD;
use gatehouse_core::{ConfigError, CorsPolicy};
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer, ExposeHeaders};

/// Build the CORS layer for `policy`.
pub fn cors_layer(policy: &CorsPolicy) -> Result<CorsLayer, ConfigError> {
    policy.validate()?;

    let layer = CorsLayer::new()
        .allow_origin(allow_origin(policy)?)
        .allow_methods(allow_methods(policy)?)
        .allow_headers(allow_headers(policy)?)
        .expose_headers(expose_headers(policy)?)
        .allow_credentials(policy.allow_credentials)
        .max_age(Duration::from_secs(policy.max_age_secs));

    Ok(layer)
}

fn allow_origin(policy: &CorsPolicy) -> Result<AllowOrigin, ConfigError> {
    if policy.any_origin() {
        return Ok(if policy.allow_credentials {
            AllowOrigin::mirror_request()
        } else {
            AllowOrigin::any()
        });
    }

    if policy.has_origin_patterns() {
        let policy = policy.clone();
        return Ok(AllowOrigin::predicate(move |origin: &HeaderValue, _| {
            origin
                .to_str()
                .map(|o| policy.origin_allowed(o))
                .unwrap_or(false)
        }));
    }

    let origins = policy
        .allowed_origins
        .iter()
        .map(|o| {
            HeaderValue::from_str(o)
                .map_err(|_| ConfigError::InvalidCors(format!("invalid origin '{o}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AllowOrigin::list(origins))
}

fn allow_methods(policy: &CorsPolicy) -> Result<AllowMethods, ConfigError> {
    if policy.any_method() {
        return Ok(if policy.allow_credentials {
            AllowMethods::mirror_request()
        } else {
            Any.into()
        });
    }

    let methods = policy
        .allowed_methods
        .iter()
        .map(|m| {
            Method::from_bytes(m.to_ascii_uppercase().as_bytes())
                .map_err(|_| ConfigError::InvalidCors(format!("invalid method '{m}'")))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(AllowMethods::list(methods))
}

fn allow_headers(policy: &CorsPolicy) -> Result<AllowHeaders, ConfigError> {
    if policy.any_header() {
        return Ok(if policy.allow_credentials {
            AllowHeaders::mirror_request()
        } else {
            Any.into()
        });
    }
    Ok(AllowHeaders::list(header_names(&policy.allowed_headers)?))
}

fn expose_headers(policy: &CorsPolicy) -> Result<ExposeHeaders, ConfigError> {
    // `*` with credentials was rejected by `CorsPolicy::validate`.
    if policy.exposed_headers.iter().any(|h| h == WILDCARD) {
        return Ok(Any.into());
    }
    Ok(ExposeHeaders::list(header_names(&policy.exposed_headers)?))
}

fn header_names(names: &[String]) -> Result<Vec<HeaderName>, ConfigError> {
    names
        .iter()
        .map(|h| {
            HeaderName::from_bytes(h.as_bytes())
                .map_err(|_| ConfigError::InvalidCors(format!("invalid header name '{h}'")))
        })
        .collect()
}
