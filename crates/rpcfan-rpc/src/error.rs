//! Transport error types.

use thiserror::Error;

pub type RpcResult<T> = Result<T, RpcError>;

/// Errors raised while dialing a node or issuing a single call.
#[derive(Debug, Error)]
pub enum RpcError {
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("tls error: {0}")]
    Tls(String),

    #[error("http error: {0}")]
    Http(String),

    #[error("unexpected http status {0}")]
    Status(u16),

    #[error("node returned error {code}: {message}")]
    Node { code: i64, message: String },

    #[error("malformed response: {0}")]
    Decode(String),

    #[error("{0} not found")]
    NotFound(String),
}

impl From<serde_json::Error> for RpcError {
    fn from(e: serde_json::Error) -> Self {
        RpcError::Decode(e.to_string())
    }
}

impl From<hyper::Error> for RpcError {
    fn from(e: hyper::Error) -> Self {
        RpcError::Http(e.to_string())
    }
}
