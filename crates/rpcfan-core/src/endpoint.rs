//! Endpoint URI validation.
//!
//! An endpoint is an opaque string; identity is exact string equality and
//! no normalization is applied. Validation only checks that the string is an
//! absolute URI with a host, so `"not-a-url"` and `"localhost"` are rejected
//! while `"http://127.0.0.1:8545"` is accepted.

use url::Url;

use crate::error::{ConfigError, ConfigResult};

/// Schemes the HTTP transport cannot serve.
const UNSUPPORTED_SCHEMES: &[&str] = &["ws", "wss"];

/// Check that `endpoint` is a well-formed absolute request URI.
pub fn validate_endpoint(endpoint: &str) -> ConfigResult<()> {
    let url = Url::parse(endpoint).map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
    if !url.has_host() {
        return Err(ConfigError::InvalidEndpoint(endpoint.to_string()));
    }
    Ok(())
}

/// Reject endpoints whose scheme the request transport does not speak.
///
/// Assumes `endpoint` already passed [`validate_endpoint`].
pub fn check_transport_scheme(endpoint: &str) -> ConfigResult<()> {
    let url = Url::parse(endpoint).map_err(|_| ConfigError::InvalidEndpoint(endpoint.to_string()))?;
    if UNSUPPORTED_SCHEMES.contains(&url.scheme()) {
        return Err(ConfigError::UnsupportedScheme {
            endpoint: endpoint.to_string(),
            scheme: url.scheme().to_string(),
        });
    }
    Ok(())
}
