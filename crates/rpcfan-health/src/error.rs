//! Roster mutation errors.

use rpcfan_core::ConfigError;
use thiserror::Error;

pub type MonitorResult<T> = Result<T, MonitorError>;

#[derive(Debug, Error)]
pub enum MonitorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("endpoint already exists: {0}")]
    AlreadyExists(String),

    #[error("endpoint not found: {0}")]
    NotFound(String),
}
