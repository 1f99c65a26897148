//! Registry-file discovery
//!
//! The file holds a `DiscoveryResult` document (TOML or JSON by extension)
//! and is re-read on every cycle, so editing it changes the live set.

use std::path::{Path, PathBuf};

use config_loader::{ConfigFormat, ConfigLoader};
use contracts::{ContractError, DiscoveryResult, ProducerDiscovery};
use tracing::trace;

use crate::error::{DiscoveryError, Result};

/// Reads the producer set from a registry file
#[derive(Debug, Clone)]
pub struct FileDiscovery {
    path: PathBuf,
    format: ConfigFormat,
}

impl FileDiscovery {
    /// Create for `path`; the format is fixed by its extension
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let format = ConfigLoader::detect_format(&path)?;
        Ok(Self { path, format })
    }

    /// Registry file location
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<DiscoveryResult> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| DiscoveryError::RegistryRead {
                path: self.path.display().to_string(),
                source,
            })?;

        let result: DiscoveryResult = ConfigLoader::parse_document(&content, self.format)?;
        trace!(path = %self.path.display(), producers = result.producer_count(), "registry read");
        Ok(result.normalized())
    }
}

impl ProducerDiscovery for FileDiscovery {
    fn name(&self) -> &str {
        "file"
    }

    async fn list_producers(&self) -> std::result::Result<DiscoveryResult, ContractError> {
        self.read().await.map_err(|e| e.into_contract("file"))
    }
}
