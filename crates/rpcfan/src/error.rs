use rpcfan_core::ConfigError;
use rpcfan_dispatch::DispatchError;
use rpcfan_health::MonitorError;
use rpcfan_rpc::RpcError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Rpc(#[from] RpcError),
}
