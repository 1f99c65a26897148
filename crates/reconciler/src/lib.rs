//! # Reconciler
//!
//! Discovery-driven producer set management.
//!
//! Responsibilities:
//! - Own the `ProducerSet` (one `FrameChannel` + worker per producer)
//! - Periodically reconcile it against a `ProducerDiscovery` source
//! - Swap sets atomically under a read/write lock (full stop-and-restart)
//! - Tear everything down on shutdown
//!
//! ## Usage Example
//!
//! ```ignore
//! use reconciler::{DiscoveryReconciler, ReconcilerConfig};
//!
//! let reconciler = Arc::new(DiscoveryReconciler::new(discovery, fetcher, ReconcilerConfig::default()));
//! let producers = reconciler.producers(); // hand to the relay server
//!
//! let token = CancellationToken::new();
//! tokio::spawn({
//!     let reconciler = Arc::clone(&reconciler);
//!     let token = token.clone();
//!     async move { reconciler.run(token).await }
//! });
//! ```

mod reconciler;
mod set;
mod stats;

// Re-exports
pub use reconciler::{DiscoveryReconciler, ReconcileOutcome, ReconcilerConfig};
pub use set::{ProducerSet, ProducerSlot, SharedProducerSet};
pub use stats::{ReconcilerSnapshot, ReconcilerStats};
