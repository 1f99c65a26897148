//! FrameChannel - single-slot, drop-oldest frame cell
//!
//! One worker publishes, any number of subscribers consume. The slot only
//! ever holds the newest frame: publishing replaces an unread frame instead
//! of queueing behind it, so a slow consumer can never hold up the worker or
//! other consumers and stale frames never accumulate.
//!
//! Built on `tokio::sync::watch`, which already has the required shape: one
//! value, versioned, broadcast to every receiver, writer never blocks.

use std::sync::atomic::{AtomicU64, Ordering};

use contracts::Frame;
use tokio::sync::watch;

use crate::error::{IngestionError, Result};

#[derive(Debug, Clone, Default)]
enum Slot {
    #[default]
    Empty,
    Frame(Frame),
    Closed,
}

/// Capacity-1 broadcast cell holding the most recent frame
#[derive(Debug)]
pub struct FrameChannel {
    tx: watch::Sender<Slot>,
    published: AtomicU64,
}

impl FrameChannel {
    /// Create an open, empty channel
    pub fn new() -> Self {
        let (tx, _) = watch::channel(Slot::Empty);
        Self {
            tx,
            published: AtomicU64::new(0),
        }
    }

    /// Replace the slot content with `frame`. Never blocks.
    ///
    /// # Errors
    /// `ChannelClosed` once `close` has been called; the frame is discarded.
    pub fn publish(&self, frame: Frame) -> Result<()> {
        let accepted = self.tx.send_if_modified(|slot| match slot {
            Slot::Closed => false,
            _ => {
                *slot = Slot::Frame(frame);
                true
            }
        });

        if accepted {
            self.published.fetch_add(1, Ordering::Relaxed);
            Ok(())
        } else {
            Err(IngestionError::ChannelClosed)
        }
    }

    /// Close the channel, waking every pending and future `consume`.
    ///
    /// Idempotent.
    pub fn close(&self) {
        self.tx.send_if_modified(|slot| {
            if matches!(slot, Slot::Closed) {
                false
            } else {
                *slot = Slot::Closed;
                true
            }
        });
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        matches!(*self.tx.borrow(), Slot::Closed)
    }

    /// Latest frame without waiting, if any
    pub fn latest(&self) -> Option<Frame> {
        match &*self.tx.borrow() {
            Slot::Frame(frame) => Some(frame.clone()),
            _ => None,
        }
    }

    /// Attach a new consumer.
    ///
    /// The frame currently held (if any) is delivered to the new consumer on
    /// its first `consume`.
    pub fn subscribe(&self) -> FrameSubscriber {
        let mut rx = self.tx.subscribe();
        rx.mark_changed();
        FrameSubscriber { rx }
    }

    /// Number of attached consumers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Total frames accepted by `publish`
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }
}

impl Default for FrameChannel {
    fn default() -> Self {
        Self::new()
    }
}

/// One consumer's view of a `FrameChannel`
///
/// Each subscriber tracks which frame it has already seen, so consumers do
/// not compete: every subscriber observes the latest frame independently.
#[derive(Debug)]
pub struct FrameSubscriber {
    rx: watch::Receiver<Slot>,
}

impl FrameSubscriber {
    /// Wait for a frame newer than the last one returned.
    ///
    /// Returns `None` once the channel is closed (or dropped); every later
    /// call returns `None` immediately.
    pub async fn consume(&mut self) -> Option<Frame> {
        loop {
            if matches!(*self.rx.borrow(), Slot::Closed) {
                return None;
            }
            if self.rx.changed().await.is_err() {
                return None;
            }
            let slot = self.rx.borrow_and_update().clone();
            match slot {
                Slot::Frame(frame) => return Some(frame),
                Slot::Closed => return None,
                Slot::Empty => continue,
            }
        }
    }
}
