//! # Relay Server
//!
//! HTTP relay for live producer frames.
//!
//! Responsibilities:
//! - Resolve a stream index to its `FrameChannel` under the shared read lock
//! - Stream frames as `multipart/x-mixed-replace` until the client leaves or
//!   the channel closes
//! - Expose the current producer listing for UI refresh

pub mod error;
pub mod metrics;
pub mod multipart;
pub mod router;
pub mod server;

pub use error::{RelayError, Result};
pub use metrics::{RelayMetrics, RelaySnapshot};
pub use multipart::MultipartEncoder;
pub use router::{build_router, RelayState};
pub use server::{bind, serve};
