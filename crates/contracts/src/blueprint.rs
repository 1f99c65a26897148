//! RelayBlueprint - Config Loader output
//!
//! Describes a complete relay deployment: HTTP surface, discovery source,
//! reconciliation cadence and producer fetch behaviour.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Endpoint;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete relay configuration blueprint
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// HTTP surface
    #[serde(default)]
    pub server: ServerConfig,

    /// Where producers come from
    pub discovery: DiscoveryConfig,

    /// Reconciliation cadence
    #[serde(default)]
    pub reconcile: ReconcileConfig,

    /// Producer fetch behaviour
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Multipart boundary token
    #[serde(default = "default_boundary")]
    pub boundary: String,

    /// Content-Type of each streamed part
    #[serde(default = "default_part_content_type")]
    pub content_type: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            boundary: default_boundary(),
            content_type: default_part_content_type(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}

fn default_boundary() -> String {
    "frame".to_string()
}

fn default_part_content_type() -> String {
    "image/jpeg".to_string()
}

/// Discovery source selection, chosen once at process start
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum DiscoveryConfig {
    /// Fixed producer list
    Static {
        #[serde(default)]
        primary: Option<Endpoint>,
        #[serde(default)]
        secondaries: Vec<Endpoint>,
    },
    /// Registry document re-read every cycle
    File { path: String },
    /// Service environment variable convention
    Env {
        /// Logical group name; `None` selects the legacy `CAMERA_COUNT` layout
        #[serde(default)]
        configuration_name: Option<String>,
        /// Name of the service port to use
        #[serde(default = "default_port_name")]
        port_name: String,
    },
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::Static {
            primary: None,
            secondaries: Vec::new(),
        }
    }
}

impl DiscoveryConfig {
    /// Short mode name for logging
    pub fn mode(&self) -> &'static str {
        match self {
            Self::Static { .. } => "static",
            Self::File { .. } => "file",
            Self::Env { .. } => "env",
        }
    }
}

fn default_port_name() -> String {
    "GRPC".to_string()
}

/// When the primary producer is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrimaryResolution {
    /// Resolved on the first successful discovery, then pinned
    #[default]
    Startup,
    /// Re-resolved on every cycle
    EveryCycle,
}

/// Reconciliation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    /// Discovery period (ms)
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Primary resolution policy
    #[serde(default)]
    pub primary_resolution: PrimaryResolution,
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            primary_resolution: PrimaryResolution::default(),
        }
    }
}

impl ReconcileConfig {
    /// Discovery period
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

/// Fetcher implementation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchKind {
    /// HTTP GET against the producer
    #[default]
    Http,
    /// Synthetic frames, no network
    Mock,
}

/// Producer fetch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Fetcher implementation
    #[serde(default)]
    pub kind: FetchKind,

    /// Request path appended to the endpoint (HTTP only)
    #[serde(default = "default_fetch_path")]
    pub path: String,

    /// Per-fetch timeout (ms)
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Wait after a published frame (ms)
    #[serde(default = "default_interval_ms")]
    pub poll_interval_ms: u64,

    /// Wait after a failed or empty fetch (ms), defaults to the poll interval
    #[serde(default)]
    pub retry_interval_ms: Option<u64>,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            kind: FetchKind::default(),
            path: default_fetch_path(),
            timeout_ms: default_timeout_ms(),
            poll_interval_ms: default_interval_ms(),
            retry_interval_ms: None,
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms.unwrap_or(self.poll_interval_ms))
    }
}

fn default_interval_ms() -> u64 {
    1000
}

fn default_fetch_path() -> String {
    "/frame".to_string()
}

fn default_timeout_ms() -> u64 {
    2000
}
