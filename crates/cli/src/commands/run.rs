//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{FetchKind, RelayBlueprint};
use tracing::{info, warn};

use crate::cli::RunArgs;
use crate::runtime::{RelayRuntime, RuntimeConfig};

/// Execute the `run` command
pub async fn run_relay(args: &RunArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let mut blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after command-line overrides")?;

    info!(
        bind = %blueprint.server.bind,
        discovery = blueprint.discovery.mode(),
        fetch = ?blueprint.fetch.kind,
        interval_ms = blueprint.reconcile.interval_ms,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let runtime = RelayRuntime::new(RuntimeConfig {
        blueprint,
        metrics_port: (args.metrics_port != 0).then_some(args.metrics_port),
    });

    let stats = runtime
        .run(shutdown_signal())
        .await
        .context("Relay execution failed")?;

    info!(
        swaps = stats.reconciler.swaps,
        streams = stats.relay.streams_opened,
        duration_secs = stats.duration.as_secs_f64(),
        "Relay stopped"
    );
    stats.print_summary();

    Ok(())
}

fn apply_overrides(blueprint: &mut RelayBlueprint, args: &RunArgs) {
    if let Some(bind) = args.bind {
        info!(bind = %bind, "Overriding listen address from CLI");
        blueprint.server.bind = bind.to_string();
    }
    if args.mock {
        info!("Using mock producers");
        blueprint.fetch.kind = FetchKind::Mock;
    }
}

/// Resolves on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    warn!("Received shutdown signal, stopping relay...");
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &RelayBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Server:");
    println!("  Bind: {}", blueprint.server.bind);
    println!("  Boundary: {}", blueprint.server.boundary);
    println!("\nDiscovery: {}", blueprint.discovery.mode());
    println!(
        "Reconcile: every {} ms ({:?} primary)",
        blueprint.reconcile.interval_ms, blueprint.reconcile.primary_resolution
    );
    println!(
        "Fetch: {:?} {} (timeout {} ms, poll {} ms, retry {} ms)",
        blueprint.fetch.kind,
        blueprint.fetch.path,
        blueprint.fetch.timeout_ms,
        blueprint.fetch.poll_interval_ms,
        blueprint.fetch.retry_interval().as_millis()
    );
    println!();
}
