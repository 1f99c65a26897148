//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{DiscoveryConfig, ProducerDiscovery, RelayBlueprint};
use discovery::DiscoverySource;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    server: ServerInfo,
    discovery: DiscoveryInfo,
    reconcile: ReconcileInfo,
    fetch: FetchInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    discovered: Option<DiscoveredInfo>,
}

#[derive(Serialize)]
struct ServerInfo {
    bind: String,
    boundary: String,
    content_type: String,
}

#[derive(Serialize)]
struct DiscoveryInfo {
    mode: String,
    detail: String,
}

#[derive(Serialize)]
struct ReconcileInfo {
    interval_ms: u64,
    primary_resolution: String,
}

#[derive(Serialize)]
struct FetchInfo {
    kind: String,
    path: String,
    timeout_ms: u64,
    poll_interval_ms: u64,
    retry_interval_ms: u64,
}

#[derive(Serialize)]
struct DiscoveredInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    primary: Option<String>,
    secondaries: Vec<String>,
    label: String,
}

/// Execute the `info` command
pub async fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    if !args.config.exists() {
        anyhow::bail!("Configuration file not found: {}", args.config.display());
    }

    let blueprint = config_loader::ConfigLoader::load_from_path(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;

    let discovered = if args.discover {
        Some(discover_once(&blueprint).await?)
    } else {
        None
    };

    let info = build_config_info(&blueprint, discovered);
    if args.json {
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&info);
    }

    Ok(())
}

/// Query the configured discovery source a single time
async fn discover_once(blueprint: &RelayBlueprint) -> Result<DiscoveredInfo> {
    let source = DiscoverySource::from_config(&blueprint.discovery)
        .context("Failed to build discovery source")?;

    let result = source
        .list_producers()
        .await
        .context("Discovery query failed")?;

    Ok(DiscoveredInfo {
        primary: result.primary.as_ref().map(ToString::to_string),
        secondaries: result.secondaries.iter().map(ToString::to_string).collect(),
        label: result.label(),
    })
}

fn discovery_detail(discovery: &DiscoveryConfig) -> String {
    match discovery {
        DiscoveryConfig::Static {
            primary,
            secondaries,
        } => format!(
            "primary={}, secondaries={}",
            primary.as_ref().map_or("-", |p| p.as_str()),
            secondaries.len()
        ),
        DiscoveryConfig::File { path } => format!("registry={path}"),
        DiscoveryConfig::Env {
            configuration_name,
            port_name,
        } => match configuration_name {
            Some(name) => format!("configuration={name}, port={port_name}"),
            None => "legacy CAMERA_* variables".to_string(),
        },
    }
}

fn build_config_info(blueprint: &RelayBlueprint, discovered: Option<DiscoveredInfo>) -> ConfigInfo {
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        server: ServerInfo {
            bind: blueprint.server.bind.clone(),
            boundary: blueprint.server.boundary.clone(),
            content_type: blueprint.server.content_type.clone(),
        },
        discovery: DiscoveryInfo {
            mode: blueprint.discovery.mode().to_string(),
            detail: discovery_detail(&blueprint.discovery),
        },
        reconcile: ReconcileInfo {
            interval_ms: blueprint.reconcile.interval_ms,
            primary_resolution: format!("{:?}", blueprint.reconcile.primary_resolution),
        },
        fetch: FetchInfo {
            kind: format!("{:?}", blueprint.fetch.kind),
            path: blueprint.fetch.path.clone(),
            timeout_ms: blueprint.fetch.timeout_ms,
            poll_interval_ms: blueprint.fetch.poll_interval_ms,
            retry_interval_ms: blueprint.fetch.retry_interval().as_millis() as u64,
        },
        discovered,
    }
}

fn print_config_info(info: &ConfigInfo) {
    println!("Frame Relay Configuration ({})\n", info.version);

    println!("Server");
    println!("   ├─ Bind: {}", info.server.bind);
    println!("   ├─ Boundary: {}", info.server.boundary);
    println!("   └─ Part type: {}", info.server.content_type);

    println!("\nDiscovery");
    println!("   ├─ Mode: {}", info.discovery.mode);
    println!("   └─ {}", info.discovery.detail);

    println!("\nReconcile");
    println!("   ├─ Interval: {} ms", info.reconcile.interval_ms);
    println!("   └─ Primary: {}", info.reconcile.primary_resolution);

    println!("\nFetch");
    println!("   ├─ Kind: {}", info.fetch.kind);
    println!("   ├─ Path: {}", info.fetch.path);
    println!("   ├─ Timeout: {} ms", info.fetch.timeout_ms);
    println!("   ├─ Poll: {} ms", info.fetch.poll_interval_ms);
    println!("   └─ Retry: {} ms", info.fetch.retry_interval_ms);

    if let Some(ref discovered) = info.discovered {
        println!("\nDiscovered producers");
        match discovered.primary {
            Some(ref primary) => println!("   [0] {primary}"),
            None => println!("   [0] (no primary)"),
        }
        for (i, endpoint) in discovered.secondaries.iter().enumerate() {
            println!("   [{}] {endpoint}", i + 1);
        }
        println!("   label: {}", discovered.label);
    }

    println!();
}
