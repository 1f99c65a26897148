//! HTTP surface of the relay
//!
//! Routes:
//! - GET /                          count, label, generation
//! - GET /producers                 `primary+sec1,sec2` label
//! - GET /camera_list               alias of /producers
//! - GET /producers.json            structured listing
//! - GET /stream/{index}            multipart frame stream
//! - GET /camera_frame_feed/{index} alias of /stream/{index}
//! - GET /healthz

use std::convert::Infallible;
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use axum::Router;
use bytes::Bytes;
use contracts::ProducerLabel;
use futures::stream;
use ingestion::FrameSubscriber;
use reconciler::SharedProducerSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::error::{RelayError, Result};
use crate::metrics::RelayMetrics;
use crate::multipart::MultipartEncoder;

/// State shared by every handler
#[derive(Clone)]
pub struct RelayState {
    pub producers: SharedProducerSet,
    pub metrics: Arc<RelayMetrics>,
    pub encoder: Arc<MultipartEncoder>,
}

impl RelayState {
    pub fn new(producers: SharedProducerSet, encoder: MultipartEncoder) -> Self {
        Self {
            producers,
            metrics: Arc::new(RelayMetrics::new()),
            encoder: Arc::new(encoder),
        }
    }
}

pub fn build_router(state: RelayState) -> Router {
    Router::new()
        .route("/", get(handle_index))
        .route("/producers", get(handle_producers))
        .route("/camera_list", get(handle_producers))
        .route("/producers.json", get(handle_producers_json))
        .route("/stream/{index}", get(handle_stream))
        .route("/camera_frame_feed/{index}", get(handle_stream))
        .route("/healthz", get(|| async { "ok" }))
        .with_state(state)
}

// ---------- Data types ----------

#[derive(Serialize)]
struct IndexResponse {
    count: usize,
    label: String,
    generation: u64,
}

#[derive(Serialize)]
struct ListingResponse {
    generation: u64,
    producers: Vec<ProducerLabel>,
}

// ---------- Handlers ----------

async fn handle_index(State(state): State<RelayState>) -> Json<IndexResponse> {
    let set = state.producers.read().await;
    Json(IndexResponse {
        count: set.len(),
        label: set.label(),
        generation: set.generation(),
    })
}

async fn handle_producers(State(state): State<RelayState>) -> String {
    state.producers.read().await.label()
}

async fn handle_producers_json(State(state): State<RelayState>) -> Json<ListingResponse> {
    let set = state.producers.read().await;
    Json(ListingResponse {
        generation: set.generation(),
        producers: set.listing(),
    })
}

async fn handle_stream(
    State(state): State<RelayState>,
    Path(raw): Path<String>,
) -> Result<Response> {
    let index = match raw.parse::<usize>() {
        Ok(index) => index,
        Err(_) => {
            state.metrics.rejected();
            return Err(RelayError::InvalidIndex { raw });
        }
    };

    let (subscriber, generation) = {
        let set = state.producers.read().await;
        match set.channel(index) {
            Some(channel) => (channel.subscribe(), set.generation()),
            None => {
                state.metrics.rejected();
                return Err(RelayError::UnknownProducer {
                    index,
                    count: set.len(),
                });
            }
        }
    };

    info!(index, generation, "stream opened");
    let guard = StreamGuard::open(index, Arc::clone(&state.metrics));
    let body = Body::from_stream(frame_stream(
        subscriber,
        Arc::clone(&state.encoder),
        guard,
    ));

    Ok((
        [
            (header::CONTENT_TYPE, state.encoder.response_content_type().to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
        ],
        body,
    )
        .into_response())
}

/// Keeps stream accounting balanced however the body ends
struct StreamGuard {
    index: usize,
    metrics: Arc<RelayMetrics>,
}

impl StreamGuard {
    fn open(index: usize, metrics: Arc<RelayMetrics>) -> Self {
        metrics.stream_opened();
        observability::record_stream_opened(index);
        Self { index, metrics }
    }
}

impl Drop for StreamGuard {
    fn drop(&mut self) {
        self.metrics.stream_closed();
        observability::record_stream_closed(self.index);
        debug!(index = self.index, "stream closed");
    }
}

/// One multipart part per consumed frame, ending when the channel closes.
fn frame_stream(
    subscriber: FrameSubscriber,
    encoder: Arc<MultipartEncoder>,
    guard: StreamGuard,
) -> impl futures::Stream<Item = std::result::Result<Bytes, Infallible>> + Send + 'static {
    stream::unfold(
        (subscriber, encoder, guard),
        |(mut subscriber, encoder, guard)| async move {
            let frame = subscriber.consume().await?;
            guard.metrics.frame_streamed(frame.len());
            observability::record_frame_streamed(guard.index, frame.len());
            let part = encoder.encode(&frame);
            Some((Ok(part), (subscriber, encoder, guard)))
        },
    )
}
