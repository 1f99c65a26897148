//! HTTP frame fetcher
//!
//! Each fetch is a `GET http://{endpoint}{path}`. A 2xx response body is the
//! frame; an empty body means "no new frame".

use std::time::Duration;

use contracts::{ContractError, Endpoint, Frame, FrameFetcher};
use tracing::trace;

use crate::error::{IngestionError, Result};

/// Fetches frames over plain HTTP
#[derive(Debug, Clone)]
pub struct HttpFrameFetcher {
    client: reqwest::Client,
    path: String,
}

impl HttpFrameFetcher {
    /// Create a fetcher requesting `path` on every producer
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| IngestionError::ClientBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            path: path.into(),
        })
    }

    /// Frame URL for `endpoint`
    pub fn url(&self, endpoint: &Endpoint) -> String {
        format!("http://{}{}", endpoint, self.path)
    }
}

impl FrameFetcher for HttpFrameFetcher {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch_frame(
        &self,
        endpoint: &Endpoint,
        timeout: Duration,
    ) -> std::result::Result<Frame, ContractError> {
        let url = self.url(endpoint);

        let response = self
            .client
            .get(&url)
            .timeout(timeout)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| ContractError::fetch(endpoint, e.to_string()))?;

        let frame = response
            .bytes()
            .await
            .map_err(|e| ContractError::fetch(endpoint, e.to_string()))?;

        trace!(url = %url, bytes = frame.len(), "http frame");
        Ok(frame)
    }
}
