//! Worker configuration and metrics

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use contracts::FetchConfig;

/// Producer worker timing
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Wait after a published frame
    pub poll_interval: Duration,

    /// Wait after a failed or empty fetch
    pub retry_interval: Duration,

    /// Timeout handed to the fetcher
    pub fetch_timeout: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::from(&FetchConfig::default())
    }
}

impl From<&FetchConfig> for WorkerConfig {
    fn from(config: &FetchConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            retry_interval: config.retry_interval(),
            fetch_timeout: config.timeout(),
        }
    }
}

/// Ingestion metrics, shared by every worker
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Fetch calls issued
    pub fetches: AtomicU64,

    /// Frames published into a channel
    pub frames_published: AtomicU64,

    /// Fetches that returned no payload
    pub empty_fetches: AtomicU64,

    /// Fetches that failed
    pub fetch_failures: AtomicU64,

    /// Workers started
    pub workers_started: AtomicU64,

    /// Workers that reached `Stopped`
    pub workers_stopped: AtomicU64,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_fetch(&self) {
        self.fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_empty(&self) {
        self.empty_fetches.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_started(&self) {
        self.workers_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_worker_stopped(&self) {
        self.workers_stopped.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            fetches: self.fetches.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            empty_fetches: self.empty_fetches.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            workers_started: self.workers_started.load(Ordering::Relaxed),
            workers_stopped: self.workers_stopped.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub fetches: u64,
    pub frames_published: u64,
    pub empty_fetches: u64,
    pub fetch_failures: u64,
    pub workers_started: u64,
    pub workers_stopped: u64,
}

impl MetricsSnapshot {
    /// Workers currently alive
    pub fn live_workers(&self) -> u64 {
        self.workers_started.saturating_sub(self.workers_stopped)
    }
}
