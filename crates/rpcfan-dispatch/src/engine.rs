//! Dispatch engine — threshold routing and concurrent fan-out.
//!
//! Every call takes a snapshot of the live endpoints, fastest first. Small
//! requests go to the head of that list; anything above the threshold is
//! partitioned across every live node, one worker per shard, joined through
//! a bounded channel. The first shard to fail cancels the rest.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use rpcfan_rpc::{B256, Block, Connection, Dialer, Transaction, TransactionReceipt, tx_hash};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{DispatchError, DispatchResult};
use crate::family::{Blocks, Family, Receipts, Transactions};
use crate::fetch::fetch_sequential;
use crate::partition::partition_by_count;

/// What one worker reports back to the joining call.
struct ShardOutcome<T> {
    endpoint: String,
    result: DispatchResult<T>,
}

/// Routes bulk reads across a set of live endpoints.
pub struct Dispatcher<D> {
    dialer: Arc<D>,
    threshold: usize,
    request_timeout: Duration,
}

impl<D: Dialer> Dispatcher<D> {
    pub fn new(dialer: D, threshold: usize, request_timeout: Duration) -> Self {
        Self {
            dialer: Arc::new(dialer),
            threshold,
            request_timeout,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Fetch the inclusive range `[start, end]` from the fastest node.
    pub async fn blocks_by_range(
        &self,
        live: &[String],
        start: u64,
        end: u64,
    ) -> DispatchResult<HashMap<u64, Block>> {
        let fastest = fastest(live)?;
        self.check_threshold(block_extent(start, end))?;
        self.single::<Blocks, _>(fastest, start..=end).await
    }

    /// Fetch the inclusive range `[start, end]`, sharding it across every
    /// live node when it exceeds the threshold.
    pub async fn blocks_by_range_batched(
        &self,
        live: &[String],
        start: u64,
        end: u64,
    ) -> DispatchResult<HashMap<u64, Block>> {
        let fastest = fastest(live)?;
        let extent = block_extent(start, end);
        if extent <= self.threshold {
            return self.single::<Blocks, _>(fastest, start..=end).await;
        }

        // Shards are split by offset from `start` so a range ending at
        // `u64::MAX` keeps its last block.
        let shards = partition_by_count(extent, live.len())
            .into_iter()
            .zip(live)
            .map(|(offsets, endpoint)| {
                let first = start + offsets.start as u64;
                let last = start + (offsets.end - 1) as u64;
                (endpoint.clone(), first..=last)
            })
            .collect();
        self.fan_out::<Blocks, _>(shards).await
    }

    pub async fn transactions_by_hashes(
        &self,
        live: &[String],
        hashes: &[B256],
    ) -> DispatchResult<HashMap<B256, Transaction>> {
        let fastest = fastest(live)?;
        self.check_threshold(hashes.len())?;
        self.single::<Transactions, _>(fastest, hashes.iter().copied()).await
    }

    pub async fn transactions_by_hashes_batched(
        &self,
        live: &[String],
        hashes: &[B256],
    ) -> DispatchResult<HashMap<B256, Transaction>> {
        self.keyed_batched::<Transactions>(live, hashes).await
    }

    /// Receipts keyed by the hash of each transaction.
    pub async fn receipts_by_transactions(
        &self,
        live: &[String],
        txs: &[Transaction],
    ) -> DispatchResult<HashMap<B256, TransactionReceipt>> {
        let fastest = fastest(live)?;
        self.check_threshold(txs.len())?;
        self.single::<Receipts, _>(fastest, txs.iter().map(tx_hash)).await
    }

    pub async fn receipts_by_transactions_batched(
        &self,
        live: &[String],
        txs: &[Transaction],
    ) -> DispatchResult<HashMap<B256, TransactionReceipt>> {
        let hashes: Vec<B256> = txs.iter().map(tx_hash).collect();
        self.keyed_batched::<Receipts>(live, &hashes).await
    }

    /// Time `repetitions` fetches of one block on every live node at once.
    ///
    /// The block is drawn at random from `[0, height)` per node so the
    /// numbers are not skewed by a node answering from its cache.
    pub async fn benchmark(
        &self,
        live: &[String],
        height: u64,
        repetitions: usize,
    ) -> DispatchResult<HashMap<String, Duration>> {
        if live.is_empty() {
            return Err(DispatchError::NoAliveNode);
        }

        let (tx, mut rx) = mpsc::channel(live.len());
        for endpoint in live {
            let number = random_height(height);
            let endpoint = endpoint.clone();
            let dialer = Arc::clone(&self.dialer);
            let timeout = self.request_timeout;
            let tx = tx.clone();

            tokio::spawn(async move {
                let result = time_block_fetches(&*dialer, &endpoint, number, repetitions, timeout).await;
                let _ = tx.send(ShardOutcome { endpoint, result }).await;
            });
        }
        drop(tx);

        let mut pending: Vec<String> = live.to_vec();
        let mut elapsed = HashMap::with_capacity(live.len());
        while !pending.is_empty() {
            let Some(outcome) = rx.recv().await else {
                return Err(DispatchError::WorkerLost(pending.join(", ")));
            };
            pending.retain(|e| *e != outcome.endpoint);

            match outcome.result {
                Ok(took) => {
                    debug!(endpoint = %outcome.endpoint, ?took, "benchmark finished");
                    elapsed.insert(outcome.endpoint, took);
                }
                Err(e) => {
                    warn!(endpoint = %outcome.endpoint, error = %e, "benchmark failed");
                    return Err(DispatchError::Benchmark {
                        endpoint: outcome.endpoint,
                        source: Box::new(e),
                    });
                }
            }
        }
        Ok(elapsed)
    }

    fn check_threshold(&self, requested: usize) -> DispatchResult<()> {
        if requested > self.threshold {
            return Err(DispatchError::TooManyRequests {
                requested,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    async fn keyed_batched<F: Family>(
        &self,
        live: &[String],
        keys: &[F::Key],
    ) -> DispatchResult<HashMap<F::Key, F::Value>> {
        let fastest = fastest(live)?;
        if keys.len() <= self.threshold {
            return self.single::<F, _>(fastest, keys.iter().copied()).await;
        }

        let shards = partition_by_count(keys.len(), live.len())
            .into_iter()
            .zip(live)
            .map(|(range, endpoint)| (endpoint.clone(), keys[range].to_vec()))
            .collect();
        self.fan_out::<F, _>(shards).await
    }

    async fn dial(&self, endpoint: &str) -> DispatchResult<D::Conn> {
        let conn = tokio::time::timeout(self.request_timeout, self.dialer.dial(endpoint))
            .await
            .map_err(|_| DispatchError::Timeout(self.request_timeout))??;
        Ok(conn)
    }

    async fn single<F, I>(&self, endpoint: &str, keys: I) -> DispatchResult<HashMap<F::Key, F::Value>>
    where
        F: Family,
        I: IntoIterator<Item = F::Key>,
    {
        let mut keys = keys.into_iter().peekable();
        if keys.peek().is_none() {
            return Ok(HashMap::new());
        }

        debug!(endpoint, family = F::NAME, count = keys.size_hint().0, "single-node request");
        let mut conn = self.dial(endpoint).await?;
        fetch_sequential::<F, _, _>(&mut conn, keys, self.request_timeout, &CancellationToken::new()).await
    }

    /// Run one worker per shard and merge their maps, or fail on the first
    /// shard error.
    async fn fan_out<F, S>(&self, shards: Vec<(String, S)>) -> DispatchResult<HashMap<F::Key, F::Value>>
    where
        F: Family,
        S: IntoIterator<Item = F::Key> + Send + 'static,
        S::IntoIter: Send,
    {
        // All connections are opened before any worker starts.
        let mut dialed = Vec::with_capacity(shards.len());
        for (endpoint, keys) in shards {
            match self.dial(&endpoint).await {
                Ok(conn) => dialed.push((endpoint, keys, conn)),
                Err(e) => {
                    warn!(endpoint = %endpoint, family = F::NAME, error = %e, "shard dial failed");
                    return Err(DispatchError::batch(&endpoint, e));
                }
            }
        }

        debug!(family = F::NAME, shards = dialed.len(), "fanning out batch");

        let cancel = CancellationToken::new();
        let _cancel_on_return = cancel.clone().drop_guard();
        let (tx, mut rx) = mpsc::channel(dialed.len().max(1));
        let mut pending = Vec::with_capacity(dialed.len());

        for (endpoint, keys, mut conn) in dialed {
            pending.push(endpoint.clone());
            let tx = tx.clone();
            let cancel = cancel.clone();
            let timeout = self.request_timeout;

            tokio::spawn(async move {
                let result = fetch_sequential::<F, _, _>(&mut conn, keys, timeout, &cancel).await;
                let _ = tx.send(ShardOutcome { endpoint, result }).await;
            });
        }
        drop(tx);

        let mut merged = HashMap::new();
        while !pending.is_empty() {
            let Some(outcome) = rx.recv().await else {
                return Err(DispatchError::WorkerLost(pending.join(", ")));
            };
            pending.retain(|e| *e != outcome.endpoint);

            match outcome.result {
                Ok(part) => merged.extend(part),
                Err(e) => {
                    cancel.cancel();
                    warn!(endpoint = %outcome.endpoint, family = F::NAME, error = %e, "shard failed, cancelling batch");
                    return Err(DispatchError::batch(&outcome.endpoint, e));
                }
            }
        }
        Ok(merged)
    }
}

fn fastest(live: &[String]) -> DispatchResult<&str> {
    live.first().map(String::as_str).ok_or(DispatchError::NoAliveNode)
}

fn block_extent(start: u64, end: u64) -> usize {
    if start > end {
        0
    } else {
        usize::try_from(end - start).map_or(usize::MAX, |n| n.saturating_add(1))
    }
}

fn random_height(height: u64) -> u64 {
    if height == 0 {
        0
    } else {
        rand::thread_rng().gen_range(0..height)
    }
}

async fn time_block_fetches<D: Dialer>(
    dialer: &D,
    endpoint: &str,
    number: u64,
    repetitions: usize,
    timeout: Duration,
) -> DispatchResult<Duration> {
    let started = Instant::now();
    let deadline = started + timeout;

    let mut conn = tokio::time::timeout_at(deadline, dialer.dial(endpoint))
        .await
        .map_err(|_| DispatchError::Timeout(timeout))??;
    for _ in 0..repetitions {
        tokio::time::timeout_at(deadline, conn.block_by_number(number))
            .await
            .map_err(|_| DispatchError::Timeout(timeout))??;
    }
    Ok(started.elapsed())
}
