//! FrameFetcher trait - Producer transport abstraction
//!
//! How a frame travels from a producer to the relay is not the relay's
//! concern; workers only see this trait.

use std::time::Duration;

use crate::{ContractError, Endpoint, Frame};

/// Frame fetch trait
///
/// One call retrieves the producer's current frame. An empty frame with no
/// error means "no new frame" and is neither published nor treated as failure.
#[trait_variant::make(FrameFetcher: Send)]
pub trait LocalFrameFetcher {
    /// Fetcher name (used for logging)
    fn name(&self) -> &str;

    /// Fetch the current frame from `endpoint`
    ///
    /// # Errors
    /// Any transport failure, including exceeding `timeout`
    async fn fetch_frame(&self, endpoint: &Endpoint, timeout: Duration)
        -> Result<Frame, ContractError>;
}
