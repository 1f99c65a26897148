//! Reconciler counters

use std::sync::atomic::{AtomicU64, Ordering};

/// Reconciliation statistics
#[derive(Debug, Default)]
pub struct ReconcilerStats {
    /// Completed reconciliation cycles
    pub cycles: AtomicU64,

    /// Cycles that found the set unchanged
    pub unchanged: AtomicU64,

    /// Set swaps (full stop-and-restart)
    pub swaps: AtomicU64,

    /// Workers started across all swaps
    pub workers_started: AtomicU64,

    /// Workers stopped across all swaps and shutdown
    pub workers_stopped: AtomicU64,

    /// Cycles skipped because discovery failed
    pub discovery_failures: AtomicU64,
}

impl ReconcilerStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReconcilerSnapshot {
        ReconcilerSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            unchanged: self.unchanged.load(Ordering::Relaxed),
            swaps: self.swaps.load(Ordering::Relaxed),
            workers_started: self.workers_started.load(Ordering::Relaxed),
            workers_stopped: self.workers_stopped.load(Ordering::Relaxed),
            discovery_failures: self.discovery_failures.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of `ReconcilerStats`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilerSnapshot {
    pub cycles: u64,
    pub unchanged: u64,
    pub swaps: u64,
    pub workers_started: u64,
    pub workers_stopped: u64,
    pub discovery_failures: u64,
}

impl ReconcilerSnapshot {
    /// Restarts beyond the initial start
    pub fn restarts(&self) -> u64 {
        self.swaps.saturating_sub(1)
    }
}
