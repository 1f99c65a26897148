//! # Ingestion
//!
//! Per-producer frame ingestion.
//!
//! Responsibilities:
//! - `FrameChannel`: single-slot, drop-oldest broadcast cell per producer
//! - `ProducerWorker`: polls one producer through a `FrameFetcher` and
//!   publishes every non-empty frame, retrying failures forever
//! - Fetchers: `HttpFrameFetcher` for real producers, `MockFrameFetcher`
//!   for tests and demo runs
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use ingestion::{FrameChannel, IngestionMetrics, MockFrameFetcher, ProducerWorker, WorkerConfig};
//!
//! let channel = Arc::new(FrameChannel::new());
//! let handle = ProducerWorker::new(
//!     endpoint,
//!     Arc::clone(&channel),
//!     Arc::new(MockFrameFetcher::default()),
//!     WorkerConfig::default(),
//!     Arc::new(IngestionMetrics::new()),
//! )
//! .spawn();
//!
//! let mut sub = channel.subscribe();
//! while let Some(frame) = sub.consume().await {
//!     // forward frame
//! }
//! handle.stop().await?;
//! ```

mod channel;
mod config;
mod error;
mod http_fetcher;
mod mock;
mod worker;

// Re-exports
pub use channel::{FrameChannel, FrameSubscriber};
pub use config::{IngestionMetrics, MetricsSnapshot, WorkerConfig};
pub use error::{IngestionError, Result};
pub use http_fetcher::HttpFrameFetcher;
pub use mock::{MockFetchConfig, MockFrameFetcher, MockFrameFormat};
pub use worker::{ProducerWorker, WorkerHandle, WorkerState};
