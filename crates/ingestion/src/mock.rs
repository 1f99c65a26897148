//! Mock frame fetcher
//!
//! Stands in for real producers in tests and `--mock` runs. Every endpoint
//! yields a distinct frame sequence; individual endpoints can be switched to
//! fail or to report "no new frame".

use std::collections::{HashMap, HashSet};
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;
use contracts::{ContractError, Endpoint, Frame, FrameFetcher};
use image::codecs::jpeg::JpegEncoder;
use image::{ExtendedColorType, Rgb, RgbImage};
use tracing::trace;

/// Payload produced by the mock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockFrameFormat {
    /// `"{endpoint}#{n}"` as UTF-8, easy to assert on
    #[default]
    Text,
    /// Solid-color JPEG, hue from the endpoint, brightness cycling with `n`
    Jpeg,
}

/// Mock fetcher configuration
#[derive(Debug, Clone)]
pub struct MockFetchConfig {
    /// Image width (Jpeg only)
    pub width: u32,

    /// Image height (Jpeg only)
    pub height: u32,

    /// Simulated round trip per fetch
    pub latency: Duration,

    /// Payload format
    pub format: MockFrameFormat,
}

impl Default for MockFetchConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            latency: Duration::ZERO,
            format: MockFrameFormat::Text,
        }
    }
}

#[derive(Debug, Default)]
struct MockState {
    counters: HashMap<Endpoint, u64>,
    calls: HashMap<Endpoint, u64>,
    failing: HashSet<Endpoint>,
    empty: HashSet<Endpoint>,
}

/// Mock frame fetcher
#[derive(Debug)]
pub struct MockFrameFetcher {
    config: MockFetchConfig,
    state: Mutex<MockState>,
}

impl MockFrameFetcher {
    /// Create a mock with the given configuration
    pub fn new(config: MockFetchConfig) -> Self {
        Self {
            config,
            state: Mutex::new(MockState::default()),
        }
    }

    /// Mock producing JPEG frames of the given size
    pub fn jpeg(width: u32, height: u32) -> Self {
        Self::new(MockFetchConfig {
            width,
            height,
            format: MockFrameFormat::Jpeg,
            ..Default::default()
        })
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Make every fetch from `endpoint` fail (or stop failing)
    pub fn set_failing(&self, endpoint: &Endpoint, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing.insert(endpoint.clone());
        } else {
            state.failing.remove(endpoint);
        }
    }

    /// Make `endpoint` report "no new frame" (or resume frames)
    pub fn set_empty(&self, endpoint: &Endpoint, empty: bool) {
        let mut state = self.state();
        if empty {
            state.empty.insert(endpoint.clone());
        } else {
            state.empty.remove(endpoint);
        }
    }

    /// Fetch calls made against `endpoint` so far
    pub fn calls_for(&self, endpoint: &Endpoint) -> u64 {
        self.state().calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Fetch calls across all endpoints
    pub fn total_calls(&self) -> u64 {
        self.state().calls.values().sum()
    }

    fn next_frame(&self, endpoint: &Endpoint) -> Result<Frame, ContractError> {
        let n = {
            let mut state = self.state();
            *state.calls.entry(endpoint.clone()).or_default() += 1;

            if state.failing.contains(endpoint) {
                return Err(ContractError::fetch(endpoint, "mock producer unavailable"));
            }
            if state.empty.contains(endpoint) {
                return Ok(Bytes::new());
            }

            let counter = state.counters.entry(endpoint.clone()).or_default();
            *counter += 1;
            *counter
        };

        match self.config.format {
            MockFrameFormat::Text => Ok(Bytes::from(format!("{endpoint}#{n}"))),
            MockFrameFormat::Jpeg => self.encode_jpeg(endpoint, n),
        }
    }

    fn encode_jpeg(&self, endpoint: &Endpoint, n: u64) -> Result<Frame, ContractError> {
        let mut hasher = DefaultHasher::new();
        endpoint.hash(&mut hasher);
        let [r, g, b, ..] = hasher.finish().to_le_bytes();
        let level = 64 + (n % 192) as u16;
        let scale = |c: u8| ((u16::from(c) * level) / 255) as u8;
        let color = Rgb([scale(r), scale(g), scale(b)]);

        let img = RgbImage::from_pixel(self.config.width, self.config.height, color);
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, 75)
            .encode(
                img.as_raw(),
                self.config.width,
                self.config.height,
                ExtendedColorType::Rgb8,
            )
            .map_err(|e| ContractError::fetch(endpoint, format!("jpeg encode failed: {e}")))?;

        Ok(Bytes::from(buf))
    }
}

impl Default for MockFrameFetcher {
    fn default() -> Self {
        Self::new(MockFetchConfig::default())
    }
}

impl FrameFetcher for MockFrameFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_frame(&self, endpoint: &Endpoint, timeout: Duration) -> Result<Frame, ContractError> {
        if !self.config.latency.is_zero() {
            if self.config.latency > timeout {
                tokio::time::sleep(timeout).await;
                *self.state().calls.entry(endpoint.clone()).or_default() += 1;
                return Err(ContractError::fetch(endpoint, "timed out"));
            }
            tokio::time::sleep(self.config.latency).await;
        }

        let frame = self.next_frame(endpoint)?;
        trace!(endpoint = %endpoint, bytes = frame.len(), "mock frame");
        Ok(frame)
    }
}
