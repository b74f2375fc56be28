//! The balancer facade — one health monitor plus one dispatcher over the
//! same endpoint pool.

use std::collections::HashMap;
use std::time::Duration;

use rpcfan_core::{Config, check_transport_scheme, validate_endpoint};
use rpcfan_dispatch::Dispatcher;
use rpcfan_health::HealthMonitor;
use rpcfan_rpc::{B256, Block, ChainIdHeartbeat, Dialer, Heartbeat, HttpDialer, Transaction, TransactionReceipt};
use tracing::debug;

use crate::error::Result;

const MONITOR_NAME: &str = "rpcfan";

/// Client-side load balancer over a pool of RPC endpoints.
///
/// Reads are routed against the live set of the last completed probe
/// cycle. Until [`start`](Self::start) has run one cycle, every read fails
/// with `NoAliveNode`.
pub struct Balancer<H = ChainIdHeartbeat<HttpDialer>, D = HttpDialer> {
    config: Config,
    monitor: HealthMonitor<H>,
    dispatcher: Dispatcher<D>,
}

impl Balancer {
    /// Build a balancer speaking JSON-RPC over HTTP, probing with
    /// `eth_chainId`.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let dialer = HttpDialer::new()?;
        Self::with_transport(ChainIdHeartbeat::new(dialer.clone()), dialer, config)
    }
}

impl<H: Heartbeat, D: Dialer> Balancer<H, D> {
    /// Build a balancer over caller-supplied probe and transport.
    pub fn with_transport(heartbeat: H, dialer: D, config: Config) -> Result<Self> {
        config.validate()?;

        let monitor = HealthMonitor::new(
            MONITOR_NAME,
            config.endpoints.clone(),
            heartbeat,
            config.heartbeat_interval,
            config.heartbeat_timeout,
        )?;
        let dispatcher = Dispatcher::new(dialer, config.threshold, config.request_timeout);
        debug!(
            endpoints = config.endpoints.len(),
            threshold = config.threshold,
            "balancer configured"
        );

        Ok(Self {
            config,
            monitor,
            dispatcher,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Start background health checks. The first cycle runs immediately.
    pub fn start(&self) {
        self.monitor.run();
    }

    /// Stop health checks and forget the live set.
    pub async fn stop(&self) {
        self.monitor.stop().await;
    }

    pub fn is_running(&self) -> bool {
        self.monitor.is_running()
    }

    /// Run one probe cycle now and install its result, whether or not the
    /// background loop is running.
    pub async fn refresh(&self) {
        self.monitor.refresh().await;
    }

    /// Add an endpoint to the roster. It becomes routable once a probe
    /// cycle sees it answer.
    pub fn add_node(&self, endpoint: &str) -> Result<()> {
        validate_endpoint(endpoint)?;
        check_transport_scheme(endpoint)?;
        self.monitor.add_endpoint(endpoint)?;
        Ok(())
    }

    /// Remove an endpoint from the roster. It stays routable until the
    /// next cycle completes.
    pub fn del_node(&self, endpoint: &str) -> Result<()> {
        validate_endpoint(endpoint)?;
        self.monitor.remove_endpoint(endpoint)?;
        Ok(())
    }

    /// Every endpoint in the roster, alive or not.
    pub fn nodes(&self) -> Vec<String> {
        self.monitor.nodes()
    }

    /// Endpoints alive in the last cycle, fastest first.
    pub fn live_nodes(&self) -> Vec<String> {
        self.monitor.live_endpoints()
    }

    pub fn live_latencies(&self) -> HashMap<String, Duration> {
        self.monitor.live_latencies()
    }

    /// Time `repetitions` fetches of a random block below `height` on every
    /// live node.
    pub async fn benchmark(&self, height: u64, repetitions: usize) -> Result<HashMap<String, Duration>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.benchmark(&live, height, repetitions).await?)
    }

    /// Blocks `start..=end` from the fastest node. Fails with
    /// `TooManyRequests` above the threshold.
    pub async fn blocks_by_range(&self, start: u64, end: u64) -> Result<HashMap<u64, Block>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.blocks_by_range(&live, start, end).await?)
    }

    /// Blocks `start..=end`, sharded across every live node above the
    /// threshold.
    pub async fn blocks_by_range_batched(&self, start: u64, end: u64) -> Result<HashMap<u64, Block>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.blocks_by_range_batched(&live, start, end).await?)
    }

    pub async fn transactions_by_hashes(&self, hashes: &[B256]) -> Result<HashMap<B256, Transaction>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.transactions_by_hashes(&live, hashes).await?)
    }

    pub async fn transactions_by_hashes_batched(
        &self,
        hashes: &[B256],
    ) -> Result<HashMap<B256, Transaction>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.transactions_by_hashes_batched(&live, hashes).await?)
    }

    pub async fn receipts_by_transactions(&self, txs: &[Transaction]) -> Result<HashMap<B256, TransactionReceipt>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.receipts_by_transactions(&live, txs).await?)
    }

    pub async fn receipts_by_transactions_batched(
        &self,
        txs: &[Transaction],
    ) -> Result<HashMap<B256, TransactionReceipt>> {
        let live = self.live_nodes();
        Ok(self.dispatcher.receipts_by_transactions_batched(&live, txs).await?)
    }
}
