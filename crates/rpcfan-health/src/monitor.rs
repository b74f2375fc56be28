//! Health monitor — background task that probes every endpoint on a timer.
//!
//! The `HealthMonitor` owns the roster of endpoints and the ranked live
//! set. One background task runs probe cycles: every endpoint in a roster
//! snapshot is probed concurrently against one shared deadline, and the
//! successful ones are installed as the new live set, fastest first.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;

use tokio::sync::{Mutex as AsyncMutex, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};

use rpcfan_core::validate_endpoint;
use rpcfan_rpc::Heartbeat;

use crate::error::{MonitorError, MonitorResult};
use crate::ranking::LatencyHeap;

/// Roster plus the result of the last completed cycle.
#[derive(Debug, Default)]
struct Members {
    roster: Vec<String>,
    /// Endpoints that answered in the last cycle, fastest first.
    live: Vec<String>,
    latencies: HashMap<String, Duration>,
}

struct Inner<H> {
    name: String,
    heartbeat: Arc<H>,
    interval: Duration,
    timeout: Duration,
    members: RwLock<Members>,
    /// Held for a whole probe-and-install cycle.
    cycle: AsyncMutex<()>,
}

/// Handle to the running probe loop.
struct LoopSlot {
    handle: JoinHandle<()>,
    shutdown_tx: watch::Sender<bool>,
}

/// Tracks which endpoints are alive and how fast they answered.
pub struct HealthMonitor<H> {
    inner: Arc<Inner<H>>,
    slot: Mutex<Option<LoopSlot>>,
}

impl<H: Heartbeat> HealthMonitor<H> {
    /// Create a monitor over `endpoints`. Every endpoint must be a valid URI.
    pub fn new(
        name: impl Into<String>,
        endpoints: Vec<String>,
        heartbeat: H,
        interval: Duration,
        timeout: Duration,
    ) -> MonitorResult<Self> {
        for endpoint in &endpoints {
            validate_endpoint(endpoint)?;
        }

        Ok(Self {
            inner: Arc::new(Inner {
                name: name.into(),
                heartbeat: Arc::new(heartbeat),
                interval,
                timeout,
                members: RwLock::new(Members {
                    roster: endpoints,
                    ..Default::default()
                }),
                cycle: AsyncMutex::new(()),
            }),
            slot: Mutex::new(None),
        })
    }

    /// Start the probe loop. The first cycle fires immediately.
    ///
    /// Does nothing if the loop is already running. Must be called from
    /// within a tokio runtime.
    pub fn run(&self) {
        let mut slot = self.slot.lock().expect("monitor slot lock");
        if slot.is_some() {
            debug!(monitor = %self.inner.name, "probe loop already running");
            return;
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let inner = self.inner.clone();
        let handle = tokio::spawn(async move {
            run_probe_loop(inner, shutdown_rx).await;
        });

        *slot = Some(LoopSlot {
            handle,
            shutdown_tx,
        });
        info!(
            monitor = %self.inner.name,
            interval_ms = self.inner.interval.as_millis() as u64,
            "health monitor started"
        );
    }

    /// Stop the probe loop and clear the live set.
    ///
    /// Safe to call when the loop is not running. Returns once the loop
    /// task has exited, so no cycle can install results afterwards.
    pub async fn stop(&self) {
        let slot = self.slot.lock().expect("monitor slot lock").take();
        if let Some(slot) = slot {
            let _ = slot.shutdown_tx.send(true);
            slot.handle.abort();
            let _ = slot.handle.await;
            info!(monitor = %self.inner.name, "health monitor stopped");
        }

        // Wait out a caller-driven refresh so it cannot install after this.
        let _cycle = self.inner.cycle.lock().await;
        let mut members = self.inner.members.write().expect("members lock");
        members.live.clear();
        members.latencies.clear();
    }

    pub fn is_running(&self) -> bool {
        self.slot.lock().expect("monitor slot lock").is_some()
    }

    /// Run one probe cycle over a roster snapshot and return the latency of
    /// every endpoint that answered. Does not touch the live set.
    pub async fn probe_all(&self) -> HashMap<String, Duration> {
        self.inner.probe_all().await
    }

    /// Run one probe cycle now and install its result as the live set.
    ///
    /// Cycles are serialized: if the background loop (or another caller)
    /// is mid-cycle, this waits for it to install first.
    pub async fn refresh(&self) {
        self.inner.refresh().await;
    }

    /// Append an endpoint to the roster. Probed from the next cycle on.
    pub fn add_endpoint(&self, endpoint: &str) -> MonitorResult<()> {
        validate_endpoint(endpoint)?;

        let mut members = self.inner.members.write().expect("members lock");
        if members.roster.iter().any(|e| e == endpoint) {
            return Err(MonitorError::AlreadyExists(endpoint.to_string()));
        }
        members.roster.push(endpoint.to_string());
        drop(members);

        info!(monitor = %self.inner.name, %endpoint, "endpoint added");
        Ok(())
    }

    /// Remove an endpoint from the roster. The current live set is left
    /// alone; the endpoint drops out of it at the next cycle.
    ///
    /// Removal swaps in the last roster entry, so roster order is not kept.
    pub fn remove_endpoint(&self, endpoint: &str) -> MonitorResult<()> {
        validate_endpoint(endpoint)?;

        let mut members = self.inner.members.write().expect("members lock");
        let idx = members
            .roster
            .iter()
            .position(|e| e == endpoint)
            .ok_or_else(|| MonitorError::NotFound(endpoint.to_string()))?;
        members.roster.swap_remove(idx);
        drop(members);

        info!(monitor = %self.inner.name, %endpoint, "endpoint removed");
        Ok(())
    }

    /// Snapshot of the roster.
    pub fn nodes(&self) -> Vec<String> {
        self.inner.nodes()
    }

    /// Endpoints alive in the last completed cycle, fastest first.
    pub fn live_endpoints(&self) -> Vec<String> {
        let members = self.inner.members.read().expect("members lock");
        members.live.clone()
    }

    /// Latency measured for each live endpoint in the last completed cycle.
    pub fn live_latencies(&self) -> HashMap<String, Duration> {
        let members = self.inner.members.read().expect("members lock");
        members.latencies.clone()
    }
}

impl<H> Drop for HealthMonitor<H> {
    fn drop(&mut self) {
        if let Ok(mut slot) = self.slot.lock() {
            if let Some(slot) = slot.take() {
                let _ = slot.shutdown_tx.send(true);
                slot.handle.abort();
            }
        }
    }
}

impl<H: Heartbeat> Inner<H> {
    fn nodes(&self) -> Vec<String> {
        let members = self.members.read().expect("members lock");
        members.roster.clone()
    }

    async fn probe_all(&self) -> HashMap<String, Duration> {
        let endpoints = self.nodes();
        if endpoints.is_empty() {
            return HashMap::new();
        }

        let (tx, mut rx) = mpsc::channel(endpoints.len());
        let start = Instant::now();
        let deadline = start + self.timeout;

        for endpoint in &endpoints {
            let tx = tx.clone();
            let heartbeat = self.heartbeat.clone();
            let endpoint = endpoint.clone();
            tokio::spawn(async move {
                let elapsed = match tokio::time::timeout_at(deadline, heartbeat.beat(&endpoint)).await {
                    Ok(Ok(())) => Some(start.elapsed()),
                    Ok(Err(e)) => {
                        debug!(%endpoint, error = %e, "probe failed");
                        None
                    }
                    Err(_) => {
                        debug!(%endpoint, "probe timed out");
                        None
                    }
                };
                let _ = tx.send((endpoint, elapsed)).await;
            });
        }
        drop(tx);

        let mut alive = HashMap::with_capacity(endpoints.len());
        for _ in 0..endpoints.len() {
            match rx.recv().await {
                Some((endpoint, Some(elapsed))) => {
                    alive.insert(endpoint, elapsed);
                }
                Some((_, None)) => {}
                None => break,
            }
        }
        alive
    }

    fn install(&self, alive: HashMap<String, Duration>) {
        let live = alive
            .iter()
            .map(|(endpoint, latency)| (endpoint.as_str(), *latency))
            .collect::<LatencyHeap>()
            .into_ordered_keys();

        let mut members = self.members.write().expect("members lock");
        members.live = live;
        members.latencies = alive;
    }

    async fn refresh(&self) {
        let _cycle = self.cycle.lock().await;
        let alive = self.probe_all().await;
        let probed = self.members.read().expect("members lock").roster.len();
        debug!(monitor = %self.name, live = alive.len(), probed, "probe cycle complete");
        self.install(alive);
    }
}

/// The probe loop. The timer is re-armed only after a cycle's result is
/// installed, so cycles never overlap.
async fn run_probe_loop<H: Heartbeat>(inner: Arc<Inner<H>>, mut shutdown: watch::Receiver<bool>) {
    let mut next = Duration::ZERO;

    loop {
        tokio::select! {
            _ = tokio::time::sleep(next) => {
                inner.refresh().await;
                next = inner.interval;
            }
            _ = shutdown.changed() => {
                debug!(monitor = %inner.name, "probe loop shutting down");
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rpcfan_core::ConfigError;
    use rpcfan_rpc::{heartbeat_fn, RpcError};

    const A: &str = "http://127.0.0.1:1823";
    const B: &str = "http://127.0.0.1:1824";
    const C: &str = "http://127.0.0.1:1825";

    fn monitor<H: Heartbeat>(endpoints: &[&str], heartbeat: H) -> HealthMonitor<H> {
        HealthMonitor::new(
            "test",
            endpoints.iter().map(|e| e.to_string()).collect(),
            heartbeat,
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .unwrap()
    }

    fn always_up() -> impl Heartbeat {
        heartbeat_fn(|_: String| async { Ok::<(), RpcError>(()) })
    }

    fn always_down() -> impl Heartbeat {
        heartbeat_fn(|e: String| async move { Err(RpcError::NotFound(e)) })
    }

    /// Answers after a per-endpoint delay: A 30ms, B 10ms, C 20ms.
    fn staggered() -> impl Heartbeat {
        heartbeat_fn(|e: String| async move {
            let ms = match e.as_str() {
                A => 30,
                B => 10,
                _ => 20,
            };
            tokio::time::sleep(Duration::from_millis(ms)).await;
            Ok::<(), RpcError>(())
        })
    }

    #[tokio::test]
    async fn probe_all_reports_every_success() {
        let m = monitor(&[A, B], always_up());
        let alive = m.probe_all().await;
        assert_eq!(alive.len(), 2);
        assert!(alive.contains_key(A) && alive.contains_key(B));
        // probe_all does not install.
        assert!(m.live_endpoints().is_empty());
    }

    #[tokio::test]
    async fn probe_all_excludes_failures() {
        let hb = heartbeat_fn(|e: String| async move {
            if e == B { Err(RpcError::NotFound(e)) } else { Ok(()) }
        });
        let m = monitor(&[A, B, C], hb);
        let alive = m.probe_all().await;
        assert_eq!(alive.len(), 2);
        assert!(!alive.contains_key(B));
    }

    #[tokio::test(start_paused = true)]
    async fn probes_share_one_deadline() {
        let hb = heartbeat_fn(|e: String| async move {
            if e == A {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok::<(), RpcError>(())
        });
        let m = monitor(&[A, B], hb);
        let alive = m.probe_all().await;
        assert_eq!(alive.keys().collect::<Vec<_>>(), vec![B]);
    }

    #[tokio::test(start_paused = true)]
    async fn live_endpoints_ranked_fastest_first() {
        let m = monitor(&[A, B, C], staggered());
        m.refresh().await;

        assert_eq!(m.live_endpoints(), vec![B, C, A]);
        let latencies = m.live_latencies();
        let fastest = latencies[B];
        assert!(latencies.values().all(|l| fastest <= *l));
    }

    #[tokio::test(start_paused = true)]
    async fn run_installs_first_cycle_immediately() {
        let m = monitor(&[A, B], always_up());
        m.run();
        assert!(m.is_running());

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(m.live_endpoints().len(), 2);

        m.stop().await;
        assert!(!m.is_running());
        assert!(m.live_endpoints().is_empty());
        assert!(m.live_latencies().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_heartbeat_leaves_live_set_empty() {
        let m = monitor(&[A, B], always_down());
        m.run();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(m.live_endpoints().is_empty());

        m.stop().await;
        assert!(m.live_endpoints().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cycles_repeat_every_interval() {
        let beats = Arc::new(AtomicUsize::new(0));
        let counter = beats.clone();
        let hb = heartbeat_fn(move |_: String| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok::<(), RpcError>(())
            }
        });

        let m = monitor(&[A, B], hb);
        m.run();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(beats.load(Ordering::SeqCst), 2);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(beats.load(Ordering::SeqCst), 4);

        m.stop().await;
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(beats.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn run_twice_is_noop_and_stop_without_run_returns() {
        let m = monitor(&[A], always_up());
        m.stop().await;
        m.stop().await;

        m.run();
        m.run();
        assert!(m.is_running());
        m.stop().await;
        m.stop().await;
        assert!(!m.is_running());
    }

    #[tokio::test]
    async fn add_rejects_duplicates_and_malformed() {
        let m = monitor(&[A], always_up());
        assert!(matches!(m.add_endpoint(A), Err(MonitorError::AlreadyExists(_))));
        assert!(matches!(
            m.add_endpoint("not-a-url"),
            Err(MonitorError::Config(ConfigError::InvalidEndpoint(_)))
        ));

        m.add_endpoint(B).unwrap();
        assert_eq!(m.nodes(), vec![A, B]);
    }

    #[tokio::test]
    async fn remove_rejects_absent_and_malformed() {
        let m = monitor(&[A], always_up());
        assert!(matches!(m.remove_endpoint(B), Err(MonitorError::NotFound(_))));
        assert!(matches!(
            m.remove_endpoint("not-a-url"),
            Err(MonitorError::Config(ConfigError::InvalidEndpoint(_)))
        ));
    }

    #[tokio::test]
    async fn remove_swaps_with_last() {
        let m = monitor(&[A, B, C], always_up());
        m.remove_endpoint(A).unwrap();
        assert_eq!(m.nodes(), vec![C, B]);
    }

    #[tokio::test]
    async fn roster_changes_apply_at_next_cycle() {
        let m = monitor(&[A, B], always_up());
        m.refresh().await;

        m.add_endpoint(C).unwrap();
        m.remove_endpoint(A).unwrap();
        let mut live = m.live_endpoints();
        live.sort();
        assert_eq!(live, vec![A, B]);

        m.refresh().await;
        let mut live = m.live_endpoints();
        live.sort();
        assert_eq!(live, vec![B, C]);
    }

    #[tokio::test(start_paused = true)]
    async fn refresh_waits_for_running_cycle() {
        let in_flight = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        let (flight, high) = (in_flight.clone(), peak.clone());
        let hb = heartbeat_fn(move |_: String| {
            let (flight, high) = (flight.clone(), high.clone());
            async move {
                let now = flight.fetch_add(1, Ordering::SeqCst) + 1;
                high.fetch_max(now, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                flight.fetch_sub(1, Ordering::SeqCst);
                Ok::<(), RpcError>(())
            }
        });

        let m = monitor(&[A], hb);
        m.run();
        tokio::join!(m.refresh(), m.refresh());
        assert_eq!(peak.load(Ordering::SeqCst), 1);
        assert_eq!(m.live_endpoints(), vec![A]);

        m.stop().await;
        assert!(m.live_endpoints().is_empty());
    }

    #[test]
    fn new_rejects_malformed_endpoint() {
        let err = HealthMonitor::new(
            "test",
            vec![A.to_string(), "dbadoy".to_string()],
            always_up(),
            Duration::from_secs(1),
            Duration::from_secs(1),
        )
        .err()
        .unwrap();
        assert!(matches!(err, MonitorError::Config(ConfigError::InvalidEndpoint(_))));
    }
}
