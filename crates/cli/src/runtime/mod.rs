//! Relay orchestration module.

mod orchestrator;
mod stats;

pub use orchestrator::{RelayRuntime, RuntimeConfig};
