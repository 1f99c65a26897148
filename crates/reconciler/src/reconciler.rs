//! DiscoveryReconciler - keeps the live ProducerSet congruent with discovery
//!
//! Each cycle: query discovery, compare by value, and on any difference
//! stop-and-join every worker of the old set, then install a fresh set.
//! The swap happens under the write lock, so readers see either the whole
//! old set or the whole new one.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use contracts::{DiscoveryResult, Endpoint, FrameFetcher, PrimaryResolution, ProducerDiscovery};
use ingestion::{IngestionMetrics, WorkerConfig};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::set::{ProducerSet, SharedProducerSet};
use crate::stats::ReconcilerStats;

/// Reconciler settings
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Period between discovery queries
    pub interval: Duration,

    /// Whether the primary is pinned at startup or re-resolved every cycle
    pub primary_resolution: PrimaryResolution,

    /// Settings handed to every worker
    pub worker: WorkerConfig,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(1),
            primary_resolution: PrimaryResolution::Startup,
            worker: WorkerConfig::default(),
        }
    }
}

/// Result of one reconciliation cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Membership unchanged, no worker touched
    Unchanged,
    /// Old set torn down and a new one installed
    Swapped {
        generation: u64,
        stopped: usize,
        started: usize,
    },
    /// Discovery failed; current set kept
    DiscoveryFailed,
}

impl ReconcileOutcome {
    fn as_str(&self) -> &'static str {
        match self {
            Self::Unchanged => "unchanged",
            Self::Swapped { .. } => "swapped",
            Self::DiscoveryFailed => "discovery_failed",
        }
    }
}

/// Owner and only writer of the producer set
pub struct DiscoveryReconciler<D, F> {
    discovery: D,
    fetcher: Arc<F>,
    config: ReconcilerConfig,
    producers: SharedProducerSet,
    pinned_primary: Mutex<Option<Endpoint>>,
    ingestion_metrics: Arc<IngestionMetrics>,
    stats: Arc<ReconcilerStats>,
}

impl<D, F> DiscoveryReconciler<D, F>
where
    D: ProducerDiscovery + Sync,
    F: FrameFetcher + Sync + 'static,
{
    /// Create with an empty producer set; nothing is polled until the first cycle
    pub fn new(discovery: D, fetcher: Arc<F>, config: ReconcilerConfig) -> Self {
        Self {
            discovery,
            fetcher,
            config,
            producers: Arc::new(RwLock::new(ProducerSet::empty(0))),
            pinned_primary: Mutex::new(None),
            ingestion_metrics: Arc::new(IngestionMetrics::new()),
            stats: Arc::new(ReconcilerStats::new()),
        }
    }

    /// Shared handle for readers
    pub fn producers(&self) -> SharedProducerSet {
        Arc::clone(&self.producers)
    }

    pub fn stats(&self) -> Arc<ReconcilerStats> {
        Arc::clone(&self.stats)
    }

    pub fn ingestion_metrics(&self) -> Arc<IngestionMetrics> {
        Arc::clone(&self.ingestion_metrics)
    }

    /// Apply the primary resolution policy to a fresh discovery result.
    ///
    /// In startup mode the first reported primary is pinned; until one is
    /// reported the set runs without a primary.
    fn resolve_primary(&self, mut desired: DiscoveryResult) -> DiscoveryResult {
        if self.config.primary_resolution == PrimaryResolution::Startup {
            let mut pinned = self
                .pinned_primary
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            match &*pinned {
                Some(primary) => desired.primary = Some(primary.clone()),
                None => *pinned = desired.primary.clone(),
            }
        }
        desired.normalized()
    }

    /// Run one reconciliation cycle
    #[instrument(name = "reconcile_once", skip(self), fields(source = self.discovery.name()))]
    pub async fn reconcile_once(&self) -> ReconcileOutcome {
        let outcome = self.reconcile_inner().await;
        ReconcilerStats::add(&self.stats.cycles, 1);
        observability::record_reconciliation(outcome.as_str());
        outcome
    }

    async fn reconcile_inner(&self) -> ReconcileOutcome {
        let desired = match self.discovery.list_producers().await {
            Ok(result) => self.resolve_primary(result),
            Err(e) => {
                ReconcilerStats::add(&self.stats.discovery_failures, 1);
                warn!(error = %e, "discovery failed, keeping current producer set");
                return ReconcileOutcome::DiscoveryFailed;
            }
        };

        if self.producers.read().await.matches(&desired) {
            ReconcilerStats::add(&self.stats.unchanged, 1);
            debug!("producer set unchanged");
            return ReconcileOutcome::Unchanged;
        }

        let started_at = Instant::now();
        let mut guard = self.producers.write().await;

        // Re-check under the write lock.
        if guard.matches(&desired) {
            ReconcilerStats::add(&self.stats.unchanged, 1);
            return ReconcileOutcome::Unchanged;
        }

        let generation = guard.generation() + 1;
        let old = std::mem::replace(&mut *guard, ProducerSet::empty(generation));
        let previous_label = old.label();
        let stopped = old.teardown().await;

        let next = ProducerSet::start(
            &desired,
            generation,
            &self.fetcher,
            &self.config.worker,
            &self.ingestion_metrics,
        );
        let started = next.len();
        *guard = next;
        drop(guard);

        ReconcilerStats::add(&self.stats.swaps, 1);
        ReconcilerStats::add(&self.stats.workers_stopped, stopped as u64);
        ReconcilerStats::add(&self.stats.workers_started, started as u64);
        observability::record_producer_count(started);
        observability::record_swap_duration_ms(started_at.elapsed().as_secs_f64() * 1000.0);

        info!(
            generation,
            stopped,
            started,
            from = %previous_label,
            to = %desired.label(),
            "producer set swapped"
        );

        ReconcileOutcome::Swapped {
            generation,
            stopped,
            started,
        }
    }

    /// Reconcile every interval until `token` is cancelled, then shut down
    #[instrument(name = "reconciler_run", skip(self, token))]
    pub async fn run(&self, token: CancellationToken) {
        info!(interval_ms = self.config.interval.as_millis() as u64, "reconciler started");

        loop {
            // A cycle is never abandoned halfway through a swap.
            self.reconcile_once().await;

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        self.shutdown().await;
    }

    /// Stop and join every worker and close every channel
    ///
    /// The shared set is left empty, so later stream requests get 404.
    #[instrument(name = "reconciler_shutdown", skip(self))]
    pub async fn shutdown(&self) {
        let mut guard = self.producers.write().await;
        let generation = guard.generation() + 1;
        let old = std::mem::replace(&mut *guard, ProducerSet::empty(generation));
        let stopped = old.teardown().await;
        drop(guard);

        ReconcilerStats::add(&self.stats.workers_stopped, stopped as u64);
        observability::record_producer_count(0);
        info!(stopped, "reconciler stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use discovery::ScriptedDiscovery;
    use ingestion::MockFrameFetcher;
    use tokio::time::timeout;

    fn ep(s: &str) -> Endpoint {
        Endpoint::parse(s).unwrap()
    }

    fn fast_config(primary_resolution: PrimaryResolution) -> ReconcilerConfig {
        ReconcilerConfig {
            interval: Duration::from_millis(10),
            primary_resolution,
            worker: WorkerConfig {
                poll_interval: Duration::from_millis(5),
                retry_interval: Duration::from_millis(5),
                fetch_timeout: Duration::from_millis(100),
            },
        }
    }

    fn reconciler(
        initial: DiscoveryResult,
        primary_resolution: PrimaryResolution,
    ) -> (
        DiscoveryReconciler<ScriptedDiscovery, MockFrameFetcher>,
        ScriptedDiscovery,
        Arc<MockFrameFetcher>,
    ) {
        let script = ScriptedDiscovery::new(initial);
        let fetcher = Arc::new(MockFrameFetcher::default());
        let reconciler = DiscoveryReconciler::new(
            script.clone(),
            Arc::clone(&fetcher),
            fast_config(primary_resolution),
        );
        (reconciler, script, fetcher)
    }

    #[tokio::test]
    async fn test_unchanged_discovery_causes_no_restart() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1"), ep("c:1")]);
        let (reconciler, _script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);

        assert!(matches!(
            reconciler.reconcile_once().await,
            ReconcileOutcome::Swapped { generation: 1, stopped: 0, started: 3 }
        ));
        let after_first = reconciler.stats().snapshot();

        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::Unchanged);
        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::Unchanged);

        let after = reconciler.stats().snapshot();
        assert_eq!(after.swaps, after_first.swaps);
        assert_eq!(after.workers_started, 3);
        assert_eq!(after.restarts(), 0);
        assert_eq!(reconciler.producers().read().await.generation(), 1);

        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_same_count_different_members_swaps() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1"), ep("c:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);
        reconciler.reconcile_once().await;

        script.set(DiscoveryResult::new(Some(ep("a:1")), vec![ep("c:1"), ep("d:1")]));
        assert_eq!(
            reconciler.reconcile_once().await,
            ReconcileOutcome::Swapped { generation: 2, stopped: 3, started: 3 }
        );

        let set = reconciler.producers();
        let set = set.read().await;
        assert_eq!(set.slot(1).unwrap().endpoint(), &ep("c:1"));
        assert_eq!(set.slot(2).unwrap().endpoint(), &ep("d:1"));
        drop(set);

        assert_eq!(reconciler.stats().snapshot().restarts(), 1);
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_swap_closes_old_channels() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);
        reconciler.reconcile_once().await;

        let old_channel = reconciler.producers().read().await.channel(1).unwrap();
        let mut sub = old_channel.subscribe();

        script.set(DiscoveryResult::new(Some(ep("a:1")), vec![ep("z:1")]));
        reconciler.reconcile_once().await;

        // Drain whatever the old worker left, then observe closure.
        let drained = timeout(Duration::from_secs(1), async {
            while let Some(frame) = sub.consume().await {
                assert!(frame.starts_with(b"b:1#"));
            }
        })
        .await;
        assert!(drained.is_ok());
        assert!(old_channel.is_closed());

        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_discovery_failure_keeps_current_set() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);
        reconciler.reconcile_once().await;

        script.fail("registry unreachable");
        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::DiscoveryFailed);

        let set = reconciler.producers();
        let guard = set.read().await;
        assert_eq!(guard.len(), 2);
        assert_eq!(guard.generation(), 1);
        let channel = guard.channel(1).unwrap();
        drop(guard);
        assert!(!channel.is_closed());

        let snapshot = reconciler.stats().snapshot();
        assert_eq!(snapshot.discovery_failures, 1);
        assert_eq!(snapshot.swaps, 1);

        script.recover();
        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::Unchanged);
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_startup_primary_is_pinned() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);
        reconciler.reconcile_once().await;

        script.set(DiscoveryResult::new(Some(ep("x:1")), vec![ep("b:1")]));
        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::Unchanged);
        assert_eq!(
            reconciler.producers().read().await.slot(0).unwrap().endpoint(),
            &ep("a:1")
        );
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_startup_pins_first_reported_primary() {
        let initial = DiscoveryResult::new(None, vec![ep("b:1")]);
        let (reconciler, script, fetcher) = reconciler(initial, PrimaryResolution::Startup);
        reconciler.reconcile_once().await;
        assert!(reconciler.producers().read().await.slot(0).is_none());

        script.set(DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]));
        assert!(matches!(
            reconciler.reconcile_once().await,
            ReconcileOutcome::Swapped { generation: 2, .. }
        ));
        assert_eq!(
            reconciler.producers().read().await.slot(0).unwrap().endpoint(),
            &ep("a:1")
        );

        // Once reported, the primary stays pinned.
        script.set(DiscoveryResult::new(None, vec![ep("b:1")]));
        assert_eq!(reconciler.reconcile_once().await, ReconcileOutcome::Unchanged);

        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(fetcher.calls_for(&ep("a:1")) > 0);
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_lost_primary_keeps_secondary_indices() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1"), ep("c:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::EveryCycle);
        reconciler.reconcile_once().await;

        script.set(DiscoveryResult::new(None, vec![ep("b:1"), ep("c:1")]));
        assert!(matches!(
            reconciler.reconcile_once().await,
            ReconcileOutcome::Swapped { .. }
        ));

        let set = reconciler.producers();
        let set = set.read().await;
        assert!(set.slot(0).is_none());
        assert_eq!(set.slot(1).unwrap().endpoint(), &ep("b:1"));
        assert_eq!(set.slot(2).unwrap().endpoint(), &ep("c:1"));
        drop(set);

        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_every_cycle_primary_is_re_resolved() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]);
        let (reconciler, script, _fetcher) = reconciler(initial, PrimaryResolution::EveryCycle);
        reconciler.reconcile_once().await;

        script.set(DiscoveryResult::new(Some(ep("x:1")), vec![ep("b:1")]));
        assert!(matches!(
            reconciler.reconcile_once().await,
            ReconcileOutcome::Swapped { .. }
        ));
        assert_eq!(
            reconciler.producers().read().await.slot(0).unwrap().endpoint(),
            &ep("x:1")
        );
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_zero_secondaries_is_valid() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![]);
        let (reconciler, _script, _fetcher) = reconciler(initial, PrimaryResolution::Startup);

        reconciler.reconcile_once().await;
        let set = reconciler.producers();
        assert_eq!(set.read().await.len(), 1);
        assert_eq!(set.read().await.label(), "a:1+");
        reconciler.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_stops_all_fetching() {
        let initial = DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1"), ep("c:1")]);
        let (reconciler, script, fetcher) = reconciler(initial, PrimaryResolution::Startup);
        let reconciler = Arc::new(reconciler);

        let token = CancellationToken::new();
        let task = {
            let reconciler = Arc::clone(&reconciler);
            let token = token.clone();
            tokio::spawn(async move { reconciler.run(token).await })
        };

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(script.calls() >= 1);
        assert!(fetcher.total_calls() > 0);

        token.cancel();
        timeout(Duration::from_secs(1), task).await.unwrap().unwrap();

        let calls = fetcher.total_calls();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(fetcher.total_calls(), calls);

        let snapshot = reconciler.stats().snapshot();
        assert_eq!(snapshot.workers_started, snapshot.workers_stopped);
        assert!(reconciler.producers().read().await.is_empty());
        assert_eq!(reconciler.ingestion_metrics().snapshot().live_workers(), 0);
    }
}
