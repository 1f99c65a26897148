//! Ingestion error types

use thiserror::Error;

/// Ingestion error
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Frame channel has been closed
    #[error("frame channel closed")]
    ChannelClosed,

    /// HTTP client could not be built
    #[error("failed to build http client: {message}")]
    ClientBuild {
        /// Error message
        message: String,
    },

    /// Worker task panicked or was aborted
    #[error("worker for {endpoint} did not stop cleanly: {message}")]
    WorkerJoin {
        /// Producer endpoint
        endpoint: String,
        /// Error message
        message: String,
    },
}

/// Ingestion Result type alias
pub type Result<T> = std::result::Result<T, IngestionError>;
