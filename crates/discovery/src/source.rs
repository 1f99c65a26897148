//! Discovery source selected from configuration

use contracts::{ContractError, DiscoveryConfig, DiscoveryResult, ProducerDiscovery};
use tracing::info;

use crate::env::EnvDiscovery;
use crate::error::Result;
use crate::file::FileDiscovery;
use crate::static_source::StaticDiscovery;

/// Any discovery source the relay can run with
#[derive(Debug, Clone)]
pub enum DiscoverySource {
    Static(StaticDiscovery),
    File(FileDiscovery),
    Env(EnvDiscovery),
}

impl DiscoverySource {
    /// Build the source described by `[discovery]`
    pub fn from_config(config: &DiscoveryConfig) -> Result<Self> {
        let source = match config {
            DiscoveryConfig::Static {
                primary,
                secondaries,
            } => Self::Static(StaticDiscovery::new(primary.clone(), secondaries.clone())),
            DiscoveryConfig::File { path } => Self::File(FileDiscovery::new(path)?),
            DiscoveryConfig::Env {
                configuration_name,
                port_name,
            } => Self::Env(EnvDiscovery::new(
                configuration_name.clone(),
                port_name.clone(),
            )),
        };
        info!(mode = config.mode(), "discovery source configured");
        Ok(source)
    }
}

impl ProducerDiscovery for DiscoverySource {
    fn name(&self) -> &str {
        match self {
            Self::Static(d) => d.name(),
            Self::File(d) => d.name(),
            Self::Env(d) => d.name(),
        }
    }

    async fn list_producers(&self) -> std::result::Result<DiscoveryResult, ContractError> {
        match self {
            Self::Static(d) => d.list_producers().await,
            Self::File(d) => d.list_producers().await,
            Self::Env(d) => d.list_producers().await,
        }
    }
}
