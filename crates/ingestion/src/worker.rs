//! ProducerWorker - polls one producer and publishes into its FrameChannel
//!
//! State machine: `Starting -> Polling -> Stopped`. Fetch failures are
//! swallowed and retried at a fixed interval forever; only cancellation ends
//! the loop. A worker never removes itself from the producer set.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use contracts::{Endpoint, FrameFetcher};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};

use crate::channel::FrameChannel;
use crate::config::{IngestionMetrics, WorkerConfig};
use crate::error::{IngestionError, Result};

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WorkerState {
    /// Spawned, loop not yet entered
    Starting = 0,
    /// Fetch loop running
    Polling = 1,
    /// Loop exited; no further fetch or publish
    Stopped = 2,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Starting,
            1 => Self::Polling,
            _ => Self::Stopped,
        }
    }
}

/// Polling worker for a single producer endpoint
pub struct ProducerWorker<F> {
    endpoint: Endpoint,
    channel: Arc<FrameChannel>,
    fetcher: Arc<F>,
    config: WorkerConfig,
    metrics: Arc<IngestionMetrics>,
}

impl<F> ProducerWorker<F>
where
    F: FrameFetcher + Sync + 'static,
{
    /// Create a worker; nothing runs until `spawn`
    pub fn new(
        endpoint: Endpoint,
        channel: Arc<FrameChannel>,
        fetcher: Arc<F>,
        config: WorkerConfig,
        metrics: Arc<IngestionMetrics>,
    ) -> Self {
        Self {
            endpoint,
            channel,
            fetcher,
            config,
            metrics,
        }
    }

    /// Start the fetch loop on the runtime with a fresh cancellation token
    pub fn spawn(self) -> WorkerHandle {
        let token = CancellationToken::new();
        let state = Arc::new(AtomicU8::new(WorkerState::Starting as u8));
        let endpoint = self.endpoint.clone();

        let join = tokio::spawn(self.run(token.clone(), Arc::clone(&state)));

        WorkerHandle {
            endpoint,
            token,
            state,
            join: Some(join),
        }
    }

    #[instrument(
        name = "producer_worker_loop",
        skip(self, token, state),
        fields(endpoint = %self.endpoint, fetcher = self.fetcher.name())
    )]
    async fn run(self, token: CancellationToken, state: Arc<AtomicU8>) {
        state.store(WorkerState::Polling as u8, Ordering::Release);
        self.metrics.record_worker_started();
        debug!(endpoint = %self.endpoint, "producer worker started");

        let mut failure_streak: u64 = 0;

        loop {
            self.metrics.record_fetch();
            let result = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                result = self.fetcher.fetch_frame(&self.endpoint, self.config.fetch_timeout) => result,
            };

            // Cancellation may have landed while the fetch completed.
            if token.is_cancelled() {
                break;
            }

            let wait = match result {
                Ok(frame) if !frame.is_empty() => {
                    if failure_streak > 0 {
                        info!(
                            endpoint = %self.endpoint,
                            failures = failure_streak,
                            "producer recovered"
                        );
                        failure_streak = 0;
                    }
                    let size = frame.len();
                    if self.channel.publish(frame).is_err() {
                        debug!(endpoint = %self.endpoint, "channel closed, stopping");
                        break;
                    }
                    self.metrics.record_published();
                    observability::record_frame_fetched(&self.endpoint, size);
                    trace!(endpoint = %self.endpoint, bytes = size, "frame published");
                    self.config.poll_interval
                }
                Ok(_) => {
                    self.metrics.record_empty();
                    observability::record_fetch_empty(&self.endpoint);
                    trace!(endpoint = %self.endpoint, "no new frame");
                    self.config.retry_interval
                }
                Err(e) => {
                    failure_streak += 1;
                    self.metrics.record_failure();
                    observability::record_fetch_failure(&self.endpoint);
                    if failure_streak == 1 {
                        warn!(endpoint = %self.endpoint, error = %e, "fetch failed, retrying");
                    } else {
                        debug!(
                            endpoint = %self.endpoint,
                            error = %e,
                            failures = failure_streak,
                            "fetch still failing"
                        );
                    }
                    self.config.retry_interval
                }
            };

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(wait) => {}
            }
        }

        state.store(WorkerState::Stopped as u8, Ordering::Release);
        self.metrics.record_worker_stopped();
        debug!(endpoint = %self.endpoint, "producer worker stopped");
    }
}

/// Handle to a running producer worker
///
/// Dropping the handle cancels the worker without waiting for it.
pub struct WorkerHandle {
    endpoint: Endpoint,
    token: CancellationToken,
    state: Arc<AtomicU8>,
    join: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Endpoint this worker polls
    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// Signal cancellation without waiting
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Whether the worker task has exited
    pub fn is_finished(&self) -> bool {
        self.join.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Wait for the worker task to exit
    pub async fn join(mut self) -> Result<()> {
        match self.join.take() {
            Some(join) => join.await.map_err(|e| IngestionError::WorkerJoin {
                endpoint: self.endpoint.to_string(),
                message: e.to_string(),
            }),
            None => Ok(()),
        }
    }

    /// Cancel and wait for the worker to exit
    #[instrument(name = "worker_handle_stop", skip(self), fields(endpoint = %self.endpoint))]
    pub async fn stop(self) -> Result<()> {
        self.cancel();
        self.join().await
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

impl std::fmt::Debug for WorkerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerHandle")
            .field("endpoint", &self.endpoint)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockFetchConfig, MockFrameFetcher};
    use std::time::Duration;
    use tokio::time::timeout;

    fn ep(s: &str) -> Endpoint {
        Endpoint::parse(s).unwrap()
    }

    fn fast_config() -> WorkerConfig {
        WorkerConfig {
            poll_interval: Duration::from_millis(5),
            retry_interval: Duration::from_millis(5),
            fetch_timeout: Duration::from_millis(100),
        }
    }

    fn spawn_worker(
        endpoint: &Endpoint,
        fetcher: &Arc<MockFrameFetcher>,
    ) -> (WorkerHandle, Arc<FrameChannel>, Arc<IngestionMetrics>) {
        let channel = Arc::new(FrameChannel::new());
        let metrics = Arc::new(IngestionMetrics::new());
        let handle = ProducerWorker::new(
            endpoint.clone(),
            Arc::clone(&channel),
            Arc::clone(fetcher),
            fast_config(),
            Arc::clone(&metrics),
        )
        .spawn();
        (handle, channel, metrics)
    }

    #[tokio::test]
    async fn test_worker_publishes_frames() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig::default()));
        let endpoint = ep("cam-a:80");
        let (handle, channel, metrics) = spawn_worker(&endpoint, &fetcher);

        let mut sub = channel.subscribe();
        let frame = timeout(Duration::from_secs(1), sub.consume())
            .await
            .unwrap()
            .unwrap();
        assert!(frame.starts_with(b"cam-a:80#"));
        assert_eq!(handle.state(), WorkerState::Polling);

        handle.stop().await.unwrap();
        let snapshot = metrics.snapshot();
        assert!(snapshot.frames_published >= 1);
        assert_eq!(snapshot.live_workers(), 0);
    }

    #[tokio::test]
    async fn test_failures_never_stop_the_worker() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig::default()));
        let endpoint = ep("flaky:80");
        fetcher.set_failing(&endpoint, true);

        let (handle, channel, metrics) = spawn_worker(&endpoint, &fetcher);
        tokio::time::sleep(Duration::from_millis(40)).await;

        assert!(metrics.snapshot().fetch_failures >= 2);
        assert_eq!(handle.state(), WorkerState::Polling);
        assert!(channel.latest().is_none());

        // Producer recovers, worker picks it up without restart
        fetcher.set_failing(&endpoint, false);
        let mut sub = channel.subscribe();
        let frame = timeout(Duration::from_secs(1), sub.consume()).await.unwrap();
        assert!(frame.is_some());

        handle.stop().await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_payload_is_not_published() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig::default()));
        let endpoint = ep("idle:80");
        fetcher.set_empty(&endpoint, true);

        let (handle, channel, metrics) = spawn_worker(&endpoint, &fetcher);
        tokio::time::sleep(Duration::from_millis(30)).await;
        handle.stop().await.unwrap();

        let snapshot = metrics.snapshot();
        assert!(snapshot.empty_fetches >= 1);
        assert_eq!(snapshot.frames_published, 0);
        assert_eq!(snapshot.fetch_failures, 0);
        assert_eq!(channel.published_count(), 0);
    }

    #[tokio::test]
    async fn test_no_fetch_or_publish_after_stop() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig::default()));
        let endpoint = ep("cam-b:80");
        let (handle, channel, _metrics) = spawn_worker(&endpoint, &fetcher);

        tokio::time::sleep(Duration::from_millis(20)).await;
        handle.stop().await.unwrap();

        let calls = fetcher.calls_for(&endpoint);
        let published = channel.published_count();
        tokio::time::sleep(Duration::from_millis(30)).await;

        assert_eq!(fetcher.calls_for(&endpoint), calls);
        assert_eq!(channel.published_count(), published);
    }

    #[tokio::test]
    async fn test_stop_interrupts_slow_fetch() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig {
            latency: Duration::from_secs(30),
            ..Default::default()
        }));
        let endpoint = ep("slow:80");
        let (handle, channel, _metrics) = spawn_worker(&endpoint, &fetcher);

        tokio::time::sleep(Duration::from_millis(10)).await;
        timeout(Duration::from_millis(100), handle.stop())
            .await
            .expect("stop should not wait for the in-flight fetch")
            .unwrap();
        assert_eq!(channel.published_count(), 0);
    }

    #[tokio::test]
    async fn test_dropping_handle_cancels_worker() {
        let fetcher = Arc::new(MockFrameFetcher::new(MockFetchConfig::default()));
        let endpoint = ep("dropped:80");
        let (handle, _channel, metrics) = spawn_worker(&endpoint, &fetcher);

        tokio::time::sleep(Duration::from_millis(10)).await;
        drop(handle);
        tokio::time::sleep(Duration::from_millis(20)).await;

        assert_eq!(metrics.snapshot().live_workers(), 0);
    }
}
