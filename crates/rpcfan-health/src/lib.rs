//! rpcfan-health — liveness monitoring for a pool of RPC endpoints.
//!
//! # Architecture
//!
//! ```text
//! HealthMonitor
//!   ├── Roster (endpoints to probe, mutated by add/remove)
//!   ├── Background task: probe cycle every heartbeat interval
//!   │   ├── one concurrent Heartbeat per endpoint, shared deadline
//!   │   └── LatencyHeap → ranked live set, installed atomically
//!   └── live_endpoints(): fastest-known-first snapshot
//! ```
//!
//! A cycle replaces the live set wholesale. An endpoint that fails its
//! probe is simply absent until a later cycle sees it answer again.

pub mod error;
pub mod monitor;
pub mod ranking;

pub use error::{MonitorError, MonitorResult};
pub use monitor::HealthMonitor;
pub use ranking::LatencyHeap;
