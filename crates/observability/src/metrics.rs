//! Relay metric recording
//!
//! Thin wrappers over the `metrics` facade so metric names live in one place.
//! Without an installed recorder every call is a no-op.

use metrics::{counter, gauge, histogram};

/// Record a frame fetched from a producer and published
pub fn record_frame_fetched(endpoint: &str, bytes: usize) {
    counter!(
        "frame_relay_frames_fetched_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
    histogram!("frame_relay_frame_size_bytes").record(bytes as f64);
}

/// Record a failed fetch
pub fn record_fetch_failure(endpoint: &str) {
    counter!(
        "frame_relay_fetch_failures_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record a fetch that returned no payload
pub fn record_fetch_empty(endpoint: &str) {
    counter!(
        "frame_relay_fetch_empty_total",
        "endpoint" => endpoint.to_string()
    )
    .increment(1);
}

/// Record one reconciliation cycle outcome (`unchanged`, `swapped`, `discovery_failed`)
pub fn record_reconciliation(outcome: &str) {
    counter!(
        "frame_relay_reconciliations_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record how long a producer set swap took, teardown included
pub fn record_swap_duration_ms(ms: f64) {
    histogram!("frame_relay_swap_duration_ms").record(ms);
}

/// Record the number of producers currently relayed
pub fn record_producer_count(count: usize) {
    gauge!("frame_relay_producers").set(count as f64);
}

/// Record a consumer stream being opened
pub fn record_stream_opened(index: usize) {
    counter!(
        "frame_relay_streams_opened_total",
        "index" => index.to_string()
    )
    .increment(1);
    gauge!("frame_relay_active_streams").increment(1.0);
}

/// Record a consumer stream ending
pub fn record_stream_closed(index: usize) {
    counter!(
        "frame_relay_streams_closed_total",
        "index" => index.to_string()
    )
    .increment(1);
    gauge!("frame_relay_active_streams").decrement(1.0);
}

/// Record a frame written to a consumer
pub fn record_frame_streamed(index: usize, bytes: usize) {
    counter!(
        "frame_relay_frames_streamed_total",
        "index" => index.to_string()
    )
    .increment(1);
    counter!("frame_relay_bytes_streamed_total").increment(bytes as u64);
}

/// Record a rejected consumer request
pub fn record_request_rejected(reason: &str) {
    counter!(
        "frame_relay_requests_rejected_total",
        "reason" => reason.to_string()
    )
    .increment(1);
}
