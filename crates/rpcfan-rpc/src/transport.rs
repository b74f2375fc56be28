//! Dial/call capability consumed by the balancer.
//!
//! Deadlines are not part of these signatures: callers bound each call
//! (or a whole sequence of calls) with `tokio::time::timeout_at`, which
//! drops the in-flight future when the deadline passes.

use async_trait::async_trait;

use crate::error::RpcResult;
use crate::types::{B256, Block, Transaction, TransactionReceipt};

/// Opens connections to endpoints.
#[async_trait]
pub trait Dialer: Send + Sync + 'static {
    type Conn: Connection;

    async fn dial(&self, endpoint: &str) -> RpcResult<Self::Conn>;
}

/// One open connection to a node. Calls on a connection are sequential.
#[async_trait]
pub trait Connection: Send + 'static {
    /// `eth_chainId`, used as the liveness probe.
    async fn chain_id(&mut self) -> RpcResult<u64>;

    async fn block_by_number(&mut self, number: u64) -> RpcResult<Block>;

    async fn transaction_by_hash(&mut self, hash: B256) -> RpcResult<Transaction>;

    async fn transaction_receipt(&mut self, hash: B256) -> RpcResult<TransactionReceipt>;
}
