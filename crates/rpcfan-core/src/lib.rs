//! rpcfan-core — shared building blocks for the rpcfan crates.
//!
//! - **`endpoint`** — syntactic validation of RPC endpoint URIs
//! - **`config`** — balancer configuration, TOML loading, and defaults
//! - **`error`** — configuration error taxonomy

pub mod config;
pub mod duration;
pub mod endpoint;
pub mod error;

pub use config::{Config, ConfigBuilder};
pub use endpoint::{check_transport_scheme, validate_endpoint};
pub use error::{ConfigError, ConfigResult};
