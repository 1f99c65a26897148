//! Relay metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Stream counters for the relay
#[derive(Debug, Default)]
pub struct RelayMetrics {
    /// Streams currently open
    active_streams: AtomicUsize,
    /// Streams opened since start
    streams_opened: AtomicU64,
    /// Frames written to consumers
    frames_streamed: AtomicU64,
    /// Frame bytes written to consumers
    bytes_streamed: AtomicU64,
    /// Requests rejected with a client error
    rejected: AtomicU64,
}

impl RelayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active_streams(&self) -> usize {
        self.active_streams.load(Ordering::Relaxed)
    }

    pub(crate) fn stream_opened(&self) {
        self.active_streams.fetch_add(1, Ordering::Relaxed);
        self.streams_opened.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn stream_closed(&self) {
        self.active_streams.fetch_sub(1, Ordering::Relaxed);
    }

    pub(crate) fn frame_streamed(&self, bytes: usize) {
        self.frames_streamed.fetch_add(1, Ordering::Relaxed);
        self.bytes_streamed.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> RelaySnapshot {
        RelaySnapshot {
            active_streams: self.active_streams(),
            streams_opened: self.streams_opened.load(Ordering::Relaxed),
            frames_streamed: self.frames_streamed.load(Ordering::Relaxed),
            bytes_streamed: self.bytes_streamed.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

/// Snapshot of relay metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelaySnapshot {
    pub active_streams: usize,
    pub streams_opened: u64,
    pub frames_streamed: u64,
    pub bytes_streamed: u64,
    pub rejected: u64,
}
