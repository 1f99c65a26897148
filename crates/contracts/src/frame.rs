//! Frame and producer listing types
//!
//! A frame is an opaque encoded image (normally JPEG). `Bytes` is reference
//! counted, so handing the same frame to many consumers never copies it.

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::Endpoint;

/// One encoded image as returned by a producer.
pub type Frame = Bytes;

/// Role of a producer within the producer set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerRole {
    /// Distinguished first producer, index 0
    Primary,
    /// Discovered producer, after the primary in sorted order
    Secondary,
}

/// Consumer-facing description of one stream index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProducerLabel {
    /// Stable index used in `/stream/{index}`
    pub index: usize,
    /// Producer address
    pub endpoint: Endpoint,
    /// Primary or secondary
    pub role: ProducerRole,
}
