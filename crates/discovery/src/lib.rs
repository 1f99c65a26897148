//! # Discovery
//!
//! Producer discovery sources.
//!
//! Responsibilities:
//! - Answer `ListProducers` with a normalized `DiscoveryResult`
//! - Static list, live registry file, and service-environment layouts
//! - Scripted source for tests and demos
//!
//! Every source reports failures as `ContractError`; the reconciler keeps
//! its current producer set when a query fails.

pub mod env;
pub mod error;
pub mod file;
pub mod scripted;
pub mod source;
pub mod static_source;

pub use contracts::{DiscoveryResult, ProducerDiscovery};
pub use env::EnvDiscovery;
pub use error::{DiscoveryError, Result};
pub use file::FileDiscovery;
pub use scripted::ScriptedDiscovery;
pub use source::DiscoverySource;
pub use static_source::StaticDiscovery;
