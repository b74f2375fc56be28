//! rpcfan-dispatch — routes bulk reads across live RPC nodes.
//!
//! # Components
//!
//! - **`partition`** — split a count or numeric range into contiguous shards
//! - **`family`** — the three request families (blocks, transactions, receipts)
//! - **`fetch`** — sequential single-node fetch under one deadline
//! - **`engine`** — threshold routing, fan-out, first-failure cancellation
//!
//! A batched call either returns the full result map or an error; partial
//! results are never surfaced.

pub mod engine;
pub mod error;
pub mod family;
pub mod fetch;
pub mod partition;

pub use engine::Dispatcher;
pub use error::{DispatchError, DispatchResult};
pub use family::{Blocks, Family, Receipts, Transactions};
pub use partition::{partition_by_count, partition_by_range, BatchPlan};
