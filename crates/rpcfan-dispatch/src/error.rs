//! Dispatch error types.

use std::time::Duration;

use rpcfan_rpc::RpcError;
use thiserror::Error;

pub type DispatchResult<T> = Result<T, DispatchError>;

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("there is no alive node")]
    NoAliveNode,

    #[error("request of {requested} items exceeds threshold {threshold}; use the batched call")]
    TooManyRequests { requested: usize, threshold: usize },

    #[error("request deadline of {0:?} exceeded")]
    Timeout(Duration),

    /// Another shard failed first and the batch was abandoned.
    #[error("batch cancelled")]
    Cancelled,

    #[error("batch request failed at {endpoint}: {source}")]
    BatchFailure {
        endpoint: String,
        #[source]
        source: Box<DispatchError>,
    },

    #[error("benchmark failed at {endpoint}: {source}")]
    Benchmark {
        endpoint: String,
        #[source]
        source: Box<DispatchError>,
    },

    #[error("shard worker for {0} exited without reporting")]
    WorkerLost(String),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl DispatchError {
    pub(crate) fn batch(endpoint: &str, source: DispatchError) -> Self {
        DispatchError::BatchFailure {
            endpoint: endpoint.to_string(),
            source: Box::new(source),
        }
    }

    /// The endpoint a batch or benchmark failure is attributed to.
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            DispatchError::BatchFailure { endpoint, .. } | DispatchError::Benchmark { endpoint, .. } => {
                Some(endpoint)
            }
            _ => None,
        }
    }
}
