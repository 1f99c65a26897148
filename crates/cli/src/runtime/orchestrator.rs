//! Wires discovery, reconciler and relay server together for one run.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use contracts::{FetchKind, FrameFetcher, RelayBlueprint};
use discovery::DiscoverySource;
use ingestion::{HttpFrameFetcher, MockFrameFetcher, WorkerConfig};
use reconciler::{DiscoveryReconciler, ReconcilerConfig};
use relay_server::{MultipartEncoder, RelayState};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::stats::RunStats;

const MOCK_WIDTH: u32 = 320;
const MOCK_HEIGHT: u32 = 240;

/// Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Validated relay configuration
    pub blueprint: RelayBlueprint,

    /// Prometheus exporter port (None = disabled)
    pub metrics_port: Option<u16>,
}

/// One relay run, from listener bind to full teardown
pub struct RelayRuntime {
    config: RuntimeConfig,
}

impl RelayRuntime {
    pub fn new(config: RuntimeConfig) -> Self {
        Self { config }
    }

    /// Run until `shutdown` resolves or the server fails
    pub async fn run(self, shutdown: impl Future<Output = ()>) -> Result<RunStats> {
        if let Some(port) = self.config.metrics_port {
            observability::init_metrics_only(port)?;
            info!("Metrics endpoint available on port {}", port);
        }

        let discovery = DiscoverySource::from_config(&self.config.blueprint.discovery)
            .context("Failed to build discovery source")?;

        match self.config.blueprint.fetch.kind {
            FetchKind::Http => {
                let fetcher = HttpFrameFetcher::new(self.config.blueprint.fetch.path.clone())
                    .context("Failed to build HTTP fetcher")?;
                self.run_with(discovery, Arc::new(fetcher), shutdown).await
            }
            FetchKind::Mock => {
                info!("Running with MOCK producers (no network fetches)");
                let fetcher = MockFrameFetcher::jpeg(MOCK_WIDTH, MOCK_HEIGHT);
                self.run_with(discovery, Arc::new(fetcher), shutdown).await
            }
        }
    }

    async fn run_with<F>(
        self,
        discovery: DiscoverySource,
        fetcher: Arc<F>,
        shutdown: impl Future<Output = ()>,
    ) -> Result<RunStats>
    where
        F: FrameFetcher + Sync + 'static,
    {
        let blueprint = &self.config.blueprint;
        let started = Instant::now();

        let reconciler = Arc::new(DiscoveryReconciler::new(
            discovery,
            fetcher,
            ReconcilerConfig {
                interval: blueprint.reconcile.interval(),
                primary_resolution: blueprint.reconcile.primary_resolution,
                worker: WorkerConfig::from(&blueprint.fetch),
            },
        ));

        let state = RelayState::new(
            reconciler.producers(),
            MultipartEncoder::new(&blueprint.server.boundary, &blueprint.server.content_type),
        );
        let relay_metrics = Arc::clone(&state.metrics);

        let addr: SocketAddr = blueprint
            .server
            .bind
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", blueprint.server.bind))?;
        let listener = relay_server::bind(addr).await?;

        let token = CancellationToken::new();

        let reconciler_task = tokio::spawn({
            let reconciler = Arc::clone(&reconciler);
            let token = token.clone();
            async move { reconciler.run(token).await }
        });
        let mut server_task = tokio::spawn(relay_server::serve(listener, state, token.clone()));

        info!(addr = %addr, "Relay running");

        let server_result = tokio::select! {
            _ = shutdown => None,
            result = &mut server_task => Some(result),
        };

        info!("Shutting down relay...");
        token.cancel();

        reconciler_task
            .await
            .context("Reconciler task panicked")?;

        let server_result = match server_result {
            Some(result) => result,
            None => server_task.await,
        };
        if let Err(ref e) = server_result {
            error!(error = %e, "Relay server task failed");
        }
        server_result.context("Relay server task panicked")??;

        Ok(RunStats {
            duration: started.elapsed(),
            reconciler: reconciler.stats().snapshot(),
            ingestion: reconciler.ingestion_metrics().snapshot(),
            relay: relay_metrics.snapshot(),
        })
    }
}
