//! Liveness probes.
//!
//! A heartbeat answers one question: did this endpoint respond? The
//! reason for a failure (refused, timed out, malformed reply) is only
//! logged; the health monitor treats every failure as "down".

use std::future::Future;

use async_trait::async_trait;

use crate::error::RpcResult;
use crate::transport::{Connection, Dialer};

/// Checks whether an endpoint is serving requests.
///
/// The caller bounds each beat with its own deadline.
#[async_trait]
pub trait Heartbeat: Send + Sync + 'static {
    async fn beat(&self, endpoint: &str) -> RpcResult<()>;
}

/// Default heartbeat: dial the endpoint and issue one `eth_chainId` call.
///
/// Dialing alone is not enough since HTTP dials succeed against anything
/// listening on the port.
pub struct ChainIdHeartbeat<D> {
    dialer: D,
}

impl<D: Dialer> ChainIdHeartbeat<D> {
    pub fn new(dialer: D) -> Self {
        Self { dialer }
    }
}

#[async_trait]
impl<D: Dialer> Heartbeat for ChainIdHeartbeat<D> {
    async fn beat(&self, endpoint: &str) -> RpcResult<()> {
        let mut conn = self.dialer.dial(endpoint).await?;
        conn.chain_id().await?;
        Ok(())
    }
}

/// Heartbeat backed by an async closure; see [`heartbeat_fn`].
pub struct FnHeartbeat<F> {
    f: F,
}

/// Wrap an async closure taking the endpoint as a [`Heartbeat`].
///
/// ```
/// use rpcfan_rpc::{heartbeat_fn, RpcError};
///
/// let always_up = heartbeat_fn(|_endpoint: String| async { Ok::<(), RpcError>(()) });
/// ```
pub fn heartbeat_fn<F, Fut>(f: F) -> FnHeartbeat<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<()>> + Send + 'static,
{
    FnHeartbeat { f }
}

#[async_trait]
impl<F, Fut> Heartbeat for FnHeartbeat<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = RpcResult<()>> + Send + 'static,
{
    async fn beat(&self, endpoint: &str) -> RpcResult<()> {
        (self.f)(endpoint.to_string()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RpcError;
    use crate::http::HttpDialer;

    #[tokio::test]
    async fn fn_heartbeat_passes_endpoint() {
        let hb = heartbeat_fn(|endpoint: String| async move {
            if endpoint.contains("up") {
                Ok(())
            } else {
                Err(RpcError::NotFound(endpoint))
            }
        });
        assert!(hb.beat("http://up.example").await.is_ok());
        assert!(hb.beat("http://down.example").await.is_err());
    }

    #[tokio::test]
    async fn chain_id_heartbeat_fails_on_closed_port() {
        let hb = ChainIdHeartbeat::new(HttpDialer::new().unwrap());
        assert!(hb.beat("http://127.0.0.1:1").await.is_err());
    }

    #[tokio::test]
    async fn chain_id_heartbeat_fails_on_malformed_endpoint() {
        let hb = ChainIdHeartbeat::new(HttpDialer::new().unwrap());
        let err = hb.beat("dbadoy").await.unwrap_err();
        assert!(matches!(err, RpcError::InvalidEndpoint(_)));
    }
}
