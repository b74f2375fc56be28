//! rpcfan-rpc — the transport boundary of the balancer.
//!
//! The health monitor and dispatch engine only need two capabilities:
//! dialing an endpoint ([`Dialer`]) and issuing one typed call over the
//! resulting [`Connection`]. This crate defines those traits, the wire
//! types they return, and a default JSON-RPC over HTTP/1.1 implementation.
//!
//! # Components
//!
//! - **`types`** — alloy `Block`, `Transaction`, `TransactionReceipt`, and `B256`
//! - **`transport`** — `Dialer` / `Connection` traits
//! - **`http`** — hyper-based `HttpDialer` with rustls for `https`
//! - **`heartbeat`** — liveness probe capability and the chain-id default
//! - **`mock`** — in-memory network for tests (`mock` feature)

pub mod error;
pub mod heartbeat;
pub mod http;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod transport;
pub mod types;

pub use error::{RpcError, RpcResult};
pub use heartbeat::{heartbeat_fn, ChainIdHeartbeat, FnHeartbeat, Heartbeat};
pub use http::{HttpConnection, HttpDialer};
pub use transport::{Connection, Dialer};
pub use types::{B256, Block, Transaction, TransactionReceipt, tx_hash};
