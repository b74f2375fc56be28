//! In-memory transport for tests and local experiments.
//!
//! A [`MockNetwork`] is a shared registry of fake nodes. Nodes can be taken
//! down (dial and every call fail), made faulty (they stay probe-able but
//! data calls fail), or slowed by a fixed per-call latency. Every data call
//! is recorded so tests can see which node served which key.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::error::{RpcError, RpcResult};
use crate::transport::{Connection, Dialer};
use crate::types::{B256, Block, Transaction, TransactionReceipt};

#[derive(Debug, Default, Clone)]
struct MockNode {
    down: bool,
    faulty: bool,
    latency: Duration,
    served: Vec<String>,
    dials: usize,
}

/// Shared registry of fake nodes.
#[derive(Clone, Default)]
pub struct MockNetwork {
    nodes: Arc<Mutex<HashMap<String, MockNode>>>,
}

impl MockNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a healthy node.
    pub fn add_node(&self, endpoint: &str) {
        self.nodes
            .lock()
            .expect("mock network lock")
            .insert(endpoint.to_string(), MockNode::default());
    }

    pub fn set_down(&self, endpoint: &str, down: bool) {
        self.with_node(endpoint, |n| n.down = down);
    }

    pub fn set_faulty(&self, endpoint: &str, faulty: bool) {
        self.with_node(endpoint, |n| n.faulty = faulty);
    }

    pub fn set_latency(&self, endpoint: &str, latency: Duration) {
        self.with_node(endpoint, |n| n.latency = latency);
    }

    /// Keys served by `endpoint`, in call order.
    pub fn served(&self, endpoint: &str) -> Vec<String> {
        self.nodes
            .lock()
            .expect("mock network lock")
            .get(endpoint)
            .map(|n| n.served.clone())
            .unwrap_or_default()
    }

    /// Number of successful dials to `endpoint`.
    pub fn dials(&self, endpoint: &str) -> usize {
        self.nodes
            .lock()
            .expect("mock network lock")
            .get(endpoint)
            .map(|n| n.dials)
            .unwrap_or(0)
    }

    pub fn dialer(&self) -> MockDialer {
        MockDialer {
            network: self.clone(),
        }
    }

    fn with_node(&self, endpoint: &str, f: impl FnOnce(&mut MockNode)) {
        if let Some(node) = self.nodes.lock().expect("mock network lock").get_mut(endpoint) {
            f(node);
        }
    }

    /// Latency to wait before answering, or an error if the node is down.
    fn admit(&self, endpoint: &str, data_call: bool) -> RpcResult<Duration> {
        let nodes = self.nodes.lock().expect("mock network lock");
        match nodes.get(endpoint) {
            Some(n) if n.down => Err(RpcError::Connect {
                endpoint: endpoint.to_string(),
                reason: "node down".to_string(),
            }),
            Some(n) if data_call && n.faulty => Err(RpcError::Node {
                code: -32000,
                message: "internal error".to_string(),
            }),
            Some(n) => Ok(n.latency),
            None => Err(RpcError::Connect {
                endpoint: endpoint.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }

    fn record(&self, endpoint: &str, key: String) {
        self.with_node(endpoint, |n| n.served.push(key));
    }
}

pub struct MockDialer {
    network: MockNetwork,
}

#[async_trait]
impl Dialer for MockDialer {
    type Conn = MockConnection;

    async fn dial(&self, endpoint: &str) -> RpcResult<MockConnection> {
        self.network.admit(endpoint, false)?;
        self.network.with_node(endpoint, |n| n.dials += 1);
        Ok(MockConnection {
            endpoint: endpoint.to_string(),
            network: self.network.clone(),
        })
    }
}

pub struct MockConnection {
    endpoint: String,
    network: MockNetwork,
}

impl MockConnection {
    async fn serve(&self, key: String) -> RpcResult<()> {
        let latency = self.network.admit(&self.endpoint, true)?;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        self.network.record(&self.endpoint, key);
        Ok(())
    }
}

/// Deterministic hash for block `n`.
pub fn block_hash(n: u64) -> B256 {
    B256::left_padding_from(&n.to_be_bytes())
}

const ZERO_ADDRESS: &str = "0x0000000000000000000000000000000000000000";
const SENDER: &str = "0x00000000000000000000000000000000000000aa";

fn empty_bloom() -> String {
    format!("0x{}", "0".repeat(512))
}

/// `eth_getBlockByNumber` response for block `n`, with no transactions.
pub(crate) fn block_json(n: u64) -> Value {
    json!({
        "hash": block_hash(n),
        "parentHash": block_hash(n.saturating_sub(1)),
        "sha3Uncles": "0x1dcc4de8dec75d7aab85b567b6ccd41ad312451b948a7413f0a142fd40d49347",
        "miner": ZERO_ADDRESS,
        "stateRoot": B256::ZERO,
        "transactionsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
        "receiptsRoot": "0x56e81f171bcc55a6ff8345e692c0f86e5b48e01b996cadc001622fb5e363b421",
        "logsBloom": empty_bloom(),
        "difficulty": "0x0",
        "number": format!("{n:#x}"),
        "gasLimit": "0x1c9c380",
        "gasUsed": "0x0",
        "timestamp": format!("{:#x}", 1_438_269_973u64.saturating_add(n.saturating_mul(12))),
        "extraData": "0x",
        "mixHash": B256::ZERO,
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x7",
        "uncles": [],
        "transactions": []
    })
}

fn transaction_json(hash: B256) -> Value {
    json!({
        "hash": hash,
        "nonce": "0x0",
        "blockHash": null,
        "blockNumber": null,
        "transactionIndex": null,
        "from": SENDER,
        "to": ZERO_ADDRESS,
        "value": "0x0",
        "gasPrice": "0x3b9aca00",
        "gas": "0x5208",
        "input": "0x",
        "v": "0x1b",
        "r": "0x1",
        "s": "0x1",
        "type": "0x0"
    })
}

fn receipt_json(hash: B256) -> Value {
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": block_hash(1),
        "blockNumber": "0x1",
        "from": SENDER,
        "to": ZERO_ADDRESS,
        "contractAddress": null,
        "gasUsed": "0x5208",
        "cumulativeGasUsed": "0x5208",
        "effectiveGasPrice": "0x3b9aca00",
        "status": "0x1",
        "logs": [],
        "logsBloom": empty_bloom(),
        "type": "0x0"
    })
}

/// A pending legacy transfer with hash `hash`, as a node would return it.
pub fn transaction(hash: B256) -> RpcResult<Transaction> {
    Ok(serde_json::from_value(transaction_json(hash))?)
}

#[async_trait]
impl Connection for MockConnection {
    async fn chain_id(&mut self) -> RpcResult<u64> {
        let latency = self.network.admit(&self.endpoint, false)?;
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        Ok(1)
    }

    async fn block_by_number(&mut self, number: u64) -> RpcResult<Block> {
        self.serve(number.to_string()).await?;
        Ok(serde_json::from_value(block_json(number))?)
    }

    async fn transaction_by_hash(&mut self, hash: B256) -> RpcResult<Transaction> {
        self.serve(hash.to_string()).await?;
        transaction(hash)
    }

    async fn transaction_receipt(&mut self, hash: B256) -> RpcResult<TransactionReceipt> {
        self.serve(hash.to_string()).await?;
        Ok(serde_json::from_value(receipt_json(hash))?)
    }
}
