//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors detected while building or validating a configuration.
///
/// These are raised at construction time only and are never retried.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid endpoint: {0:?}")]
    InvalidEndpoint(String),

    #[error("at least one endpoint is required")]
    NoEndpoints,

    #[error("unsupported endpoint scheme {scheme:?}: {endpoint}")]
    UnsupportedScheme { endpoint: String, scheme: String },

    #[error("invalid heartbeat interval: must be greater than zero")]
    InvalidInterval,

    #[error("invalid {field}: must be greater than zero")]
    InvalidTimeout { field: &'static str },

    #[error("invalid duration {0:?}")]
    InvalidDuration(String),

    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
}
