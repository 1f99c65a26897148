//! Layered error definitions
//!
//! Categorized by source: config / fetch / discovery

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Producer Errors =====
    /// Fetching a frame from a producer failed
    #[error("fetch from '{endpoint}' failed: {message}")]
    Fetch { endpoint: String, message: String },

    /// Invalid producer address
    #[error("invalid endpoint '{value}': {message}")]
    InvalidEndpoint { value: String, message: String },

    // ===== Discovery Errors =====
    /// Discovery source could not be queried
    #[error("discovery '{source_name}' failed: {message}")]
    Discovery {
        source_name: String,
        message: String,
    },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create fetch error
    pub fn fetch(endpoint: impl ToString, message: impl Into<String>) -> Self {
        Self::Fetch {
            endpoint: endpoint.to_string(),
            message: message.into(),
        }
    }

    /// Create discovery error
    pub fn discovery(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Discovery {
            source_name: source_name.into(),
            message: message.into(),
        }
    }

    /// Whether the error is transient (retry on the next tick/cycle)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::Fetch { .. } | Self::Discovery { .. } | Self::Io(_)
        )
    }
}
