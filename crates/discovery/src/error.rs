//! Discovery error types

use contracts::ContractError;
use thiserror::Error;

/// Discovery specific error
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Registry file could not be read
    #[error("failed to read registry '{path}': {source}")]
    RegistryRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Required environment variable is absent
    #[error("environment variable '{name}' is not set")]
    MissingVariable { name: String },

    /// Environment variable holds something other than expected
    #[error("environment variable '{name}' is invalid: {message}")]
    InvalidVariable { name: String, message: String },

    /// Wrapped ContractError
    #[error(transparent)]
    Contract(#[from] ContractError),
}

impl DiscoveryError {
    /// Create missing variable error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingVariable { name: name.into() }
    }

    /// Create invalid variable error
    pub fn invalid(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidVariable {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Convert into the `ContractError` surfaced by `ProducerDiscovery`
    pub fn into_contract(self, source_name: &str) -> ContractError {
        match self {
            Self::Contract(e) => e,
            other => ContractError::discovery(source_name, other.to_string()),
        }
    }
}

/// Discovery Result type alias
pub type Result<T> = std::result::Result<T, DiscoveryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_contract() {
        let err = DiscoveryError::missing("CAMERA_COUNT").into_contract("env");
        assert!(matches!(err, ContractError::Discovery { .. }));
        assert!(err.to_string().contains("CAMERA_COUNT"));

        let inner = ContractError::config_parse("bad toml");
        let err = DiscoveryError::from(inner).into_contract("file");
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }
}
