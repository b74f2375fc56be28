//! Request families.
//!
//! Each family names one per-unit remote call and its typed result, so a
//! shard's partial map is always `HashMap<F::Key, F::Value>` and the merge
//! step needs no runtime casts.

use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;

use rpcfan_rpc::{B256, Block, Connection, RpcResult, Transaction, TransactionReceipt};

pub trait Family: Send + Sync + 'static {
    type Key: Copy + Eq + Hash + Debug + Send + Sync + 'static;
    type Value: Send + 'static;

    /// Short name used in logs.
    const NAME: &'static str;

    fn fetch<'a, C: Connection>(
        conn: &'a mut C,
        key: Self::Key,
    ) -> impl Future<Output = RpcResult<Self::Value>> + Send + 'a;
}

/// Blocks by number.
pub struct Blocks;

impl Family for Blocks {
    type Key = u64;
    type Value = Block;

    const NAME: &'static str = "blocks";

    fn fetch<'a, C: Connection>(
        conn: &'a mut C,
        key: u64,
    ) -> impl Future<Output = RpcResult<Block>> + Send + 'a {
        conn.block_by_number(key)
    }
}

/// Transactions by hash.
pub struct Transactions;

impl Family for Transactions {
    type Key = B256;
    type Value = Transaction;

    const NAME: &'static str = "transactions";

    fn fetch<'a, C: Connection>(
        conn: &'a mut C,
        key: B256,
    ) -> impl Future<Output = RpcResult<Transaction>> + Send + 'a {
        conn.transaction_by_hash(key)
    }
}

/// Receipts by transaction hash.
pub struct Receipts;

impl Family for Receipts {
    type Key = B256;
    type Value = TransactionReceipt;

    const NAME: &'static str = "receipts";

    fn fetch<'a, C: Connection>(
        conn: &'a mut C,
        key: B256,
    ) -> impl Future<Output = RpcResult<TransactionReceipt>> + Send + 'a {
        conn.transaction_receipt(key)
    }
}
