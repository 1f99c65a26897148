//! ProducerSet - the live, indexed collection of producer slots
//!
//! Consumer-facing index `0` is the primary slot and `i >= 1` is the
//! `i`-th secondary in endpoint order. Index `0` stays reserved when there is
//! no primary. A set is immutable once started: membership changes replace
//! the whole set.

use std::sync::Arc;

use contracts::{DiscoveryResult, Endpoint, FrameFetcher, ProducerLabel, ProducerRole};
use ingestion::{FrameChannel, IngestionMetrics, ProducerWorker, WorkerConfig, WorkerHandle, WorkerState};
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

/// Producer set shared between the reconciler (writer) and the relay (readers)
pub type SharedProducerSet = Arc<RwLock<ProducerSet>>;

/// One polled producer: endpoint, its channel, and its worker
#[derive(Debug)]
pub struct ProducerSlot {
    endpoint: Endpoint,
    channel: Arc<FrameChannel>,
    worker: WorkerHandle,
}

impl ProducerSlot {
    /// Create a fresh channel and start a worker publishing into it
    pub fn start<F>(
        endpoint: Endpoint,
        fetcher: &Arc<F>,
        config: &WorkerConfig,
        metrics: &Arc<IngestionMetrics>,
    ) -> Self
    where
        F: FrameFetcher + Sync + 'static,
    {
        let channel = Arc::new(FrameChannel::new());
        let worker = ProducerWorker::new(
            endpoint.clone(),
            Arc::clone(&channel),
            Arc::clone(fetcher),
            config.clone(),
            Arc::clone(metrics),
        )
        .spawn();

        Self {
            endpoint,
            channel,
            worker,
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn channel(&self) -> &Arc<FrameChannel> {
        &self.channel
    }

    pub fn worker_state(&self) -> WorkerState {
        self.worker.state()
    }
}

/// Ordered producer slots of one generation
#[derive(Debug, Default)]
pub struct ProducerSet {
    primary: Option<ProducerSlot>,
    secondaries: Vec<ProducerSlot>,
    generation: u64,
}

impl ProducerSet {
    /// Set with no producers
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Default::default()
        }
    }

    /// Start one worker per endpoint in `desired`
    pub fn start<F>(
        desired: &DiscoveryResult,
        generation: u64,
        fetcher: &Arc<F>,
        config: &WorkerConfig,
        metrics: &Arc<IngestionMetrics>,
    ) -> Self
    where
        F: FrameFetcher + Sync + 'static,
    {
        let desired = desired.clone().normalized();
        let primary = desired
            .primary
            .map(|ep| ProducerSlot::start(ep, fetcher, config, metrics));
        let secondaries = desired
            .secondaries
            .into_iter()
            .map(|ep| ProducerSlot::start(ep, fetcher, config, metrics))
            .collect();

        Self {
            primary,
            secondaries,
            generation,
        }
    }

    /// Generation counter, bumped at every swap
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Number of producers
    pub fn len(&self) -> usize {
        usize::from(self.primary.is_some()) + self.secondaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Slot at consumer-facing `index`
    pub fn slot(&self, index: usize) -> Option<&ProducerSlot> {
        match index {
            0 => self.primary.as_ref(),
            i => self.secondaries.get(i - 1),
        }
    }

    /// Channel at consumer-facing `index`
    pub fn channel(&self, index: usize) -> Option<Arc<FrameChannel>> {
        self.slot(index).map(|slot| Arc::clone(&slot.channel))
    }

    /// Index, endpoint and role of every producer
    pub fn listing(&self) -> Vec<ProducerLabel> {
        let primary = self.primary.iter().map(|slot| ProducerLabel {
            index: 0,
            endpoint: slot.endpoint.clone(),
            role: ProducerRole::Primary,
        });
        let secondaries = self
            .secondaries
            .iter()
            .enumerate()
            .map(|(i, slot)| ProducerLabel {
                index: i + 1,
                endpoint: slot.endpoint.clone(),
                role: ProducerRole::Secondary,
            });
        primary.chain(secondaries).collect()
    }

    /// Membership of this set as a discovery snapshot
    pub fn endpoints(&self) -> DiscoveryResult {
        DiscoveryResult {
            primary: self.primary.as_ref().map(|s| s.endpoint.clone()),
            secondaries: self.secondaries.iter().map(|s| s.endpoint.clone()).collect(),
        }
    }

    /// `primary+sec1,sec2` label used for UI refresh
    pub fn label(&self) -> String {
        self.endpoints().label()
    }

    /// Whether `desired` has exactly this membership (by value)
    pub fn matches(&self, desired: &DiscoveryResult) -> bool {
        self.primary.as_ref().map(|s| &s.endpoint) == desired.primary.as_ref()
            && self.secondaries.len() == desired.secondaries.len()
            && self
                .secondaries
                .iter()
                .zip(&desired.secondaries)
                .all(|(slot, ep)| &slot.endpoint == ep)
    }

    /// Cancel every worker, wait for all of them, then close every channel.
    ///
    /// Channels are closed only after their worker has exited, so a consumer
    /// never receives a frame after observing closure.
    #[instrument(name = "producer_set_teardown", skip(self), fields(generation = self.generation, producers = self.len()))]
    pub async fn teardown(self) -> usize {
        let slots: Vec<ProducerSlot> = self.primary.into_iter().chain(self.secondaries).collect();

        for slot in &slots {
            slot.worker.cancel();
        }

        let mut stopped = 0;
        for slot in slots {
            let ProducerSlot {
                endpoint,
                channel,
                worker,
            } = slot;
            if let Err(e) = worker.join().await {
                warn!(endpoint = %endpoint, error = %e, "worker did not exit cleanly");
            }
            channel.close();
            stopped += 1;
        }

        debug!(stopped, "producer set torn down");
        stopped
    }
}
