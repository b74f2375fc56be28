//! Wire types returned by Ethereum JSON-RPC nodes.
//!
//! These are the node's full responses: blocks carry every header field
//! (state root, base fee, withdrawals root, ...) and their full
//! transactions, receipts carry logs and the typed envelope.

pub use alloy_primitives::B256;
pub use alloy_rpc_types_eth::{Block, Transaction, TransactionReceipt};

/// Hash of `tx` as reported by the node.
pub fn tx_hash(tx: &Transaction) -> B256 {
    *tx.inner.tx_hash()
}
