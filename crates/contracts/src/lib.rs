//! # Contracts
//!
//! Frozen interface contracts shared by every relay crate: the producer
//! address model, the frame type, the discovery snapshot and the two external
//! collaborator traits (`FrameFetcher`, `ProducerDiscovery`).
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Index Model
//! - Index `0` is the primary; `1..=N` are the secondaries in sorted
//!   `Endpoint` order
//! - Index `0` stays reserved when there is no primary, so a secondary keeps
//!   its index when the primary appears or disappears

mod blueprint;
mod discovery;
mod endpoint;
mod error;
mod fetch;
mod frame;

pub use blueprint::*;
pub use discovery::{DiscoveryResult, LocalProducerDiscovery, ProducerDiscovery};
pub use endpoint::Endpoint;
pub use error::*;
pub use fetch::{FrameFetcher, LocalFrameFetcher};
pub use frame::*;
