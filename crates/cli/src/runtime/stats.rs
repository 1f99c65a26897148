//! Run statistics.

use std::time::Duration;

use ingestion::MetricsSnapshot;
use reconciler::ReconcilerSnapshot;
use relay_server::RelaySnapshot;

/// Statistics from a relay run
#[derive(Debug, Clone, Default)]
pub struct RunStats {
    /// Total duration of the run
    pub duration: Duration,

    /// Reconciliation counters
    pub reconciler: ReconcilerSnapshot,

    /// Worker fetch counters
    pub ingestion: MetricsSnapshot,

    /// Consumer stream counters
    pub relay: RelaySnapshot,
}

impl RunStats {
    /// Frames published per second across all producers
    pub fn publish_rate(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs > 0.0 {
            self.ingestion.frames_published as f64 / secs
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Relay Statistics ===\n");

        println!("Overview");
        println!("  Duration: {:.2}s", self.duration.as_secs_f64());
        println!("  Frames published: {}", self.ingestion.frames_published);
        println!("  Publish rate: {:.2}/s", self.publish_rate());

        println!("\nReconciler");
        println!("  Cycles: {}", self.reconciler.cycles);
        println!("  Swaps: {}", self.reconciler.swaps);
        println!("  Restarts: {}", self.reconciler.restarts());
        println!("  Discovery failures: {}", self.reconciler.discovery_failures);
        println!(
            "  Workers started/stopped: {}/{}",
            self.reconciler.workers_started, self.reconciler.workers_stopped
        );

        println!("\nProducers");
        println!("  Fetches: {}", self.ingestion.fetches);
        println!("  Empty fetches: {}", self.ingestion.empty_fetches);
        println!("  Fetch failures: {}", self.ingestion.fetch_failures);

        println!("\nStreams");
        println!("  Opened: {}", self.relay.streams_opened);
        println!("  Frames streamed: {}", self.relay.frames_streamed);
        println!("  Bytes streamed: {}", self.relay.bytes_streamed);
        println!("  Rejected requests: {}", self.relay.rejected);
        println!();
    }
}
