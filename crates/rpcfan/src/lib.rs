//! rpcfan — client-side load balancing for blockchain RPC endpoints.
//!
//! A [`Balancer`] keeps a pool of endpoints under periodic health checks
//! and serves bulk reads (block ranges, transactions, receipts) from the
//! nodes that answered the last probe cycle. Small requests go to the
//! fastest node; larger ones are split into contiguous shards fetched from
//! every live node at once, and either all shards succeed or the call
//! fails.
//!
//! ```no_run
//! use rpcfan::{Balancer, Config};
//!
//! # async fn demo() -> rpcfan::Result<()> {
//! let config = Config::builder()
//!     .endpoint("https://eth.example.org")
//!     .endpoint("https://backup.example.org")
//!     .threshold(100)
//!     .build()?;
//!
//! let balancer = Balancer::new(config)?;
//! balancer.start();
//! let blocks = balancer.blocks_by_range_batched(17_000_000, 17_000_999).await?;
//! assert_eq!(blocks.len(), 1_000);
//! balancer.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod balancer;
pub mod error;

pub use balancer::Balancer;
pub use error::{Error, Result};

pub use rpcfan_core::{Config, ConfigBuilder, ConfigError};
pub use rpcfan_dispatch::{DispatchError, Dispatcher};
pub use rpcfan_health::{HealthMonitor, MonitorError};
pub use rpcfan_rpc::{
    B256, Block, ChainIdHeartbeat, Connection, Dialer, Heartbeat, HttpDialer, RpcError, Transaction,
    TransactionReceipt, heartbeat_fn, tx_hash,
};
