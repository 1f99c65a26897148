//! Relay server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Relay server error
#[derive(Debug, Error)]
pub enum RelayError {
    /// Stream index is not a non-negative integer
    #[error("invalid producer index '{raw}'")]
    InvalidIndex { raw: String },

    /// No producer currently occupies the stream index
    #[error("no producer at index {index} ({count} producers in the current set)")]
    UnknownProducer { index: usize, count: usize },

    /// Listener could not be bound
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Server loop failed
    #[error("relay server failed: {0}")]
    Serve(#[source] std::io::Error),
}

impl RelayError {
    /// HTTP status for request-level errors
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidIndex { .. } => StatusCode::BAD_REQUEST,
            Self::UnknownProducer { .. } => StatusCode::NOT_FOUND,
            Self::Bind { .. } | Self::Serve(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn reason(&self) -> &'static str {
        match self {
            Self::InvalidIndex { .. } => "invalid_index",
            Self::UnknownProducer { .. } => "unknown_producer",
            Self::Bind { .. } | Self::Serve(_) => "internal",
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        observability::record_request_rejected(self.reason());
        (self.status(), self.to_string()).into_response()
    }
}

/// Relay Result type alias
pub type Result<T> = std::result::Result<T, RelayError>;
