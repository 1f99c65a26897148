//! Service-environment discovery
//!
//! Producers are exposed as services whose addresses are injected into the
//! relay's environment. Two layouts are understood:
//!
//! - Configuration name `akri-udev-video` gives prefix `AKRI_UDEV_VIDEO_`.
//!   The primary is `{prefix}SVC_SERVICE_HOST` on port
//!   `{prefix}SVC_SERVICE_PORT_{port_name}`; every other `{prefix}*_SERVICE_HOST`
//!   is a secondary on the same port.
//! - Without a configuration name: `CAMERAS_SOURCE_SVC` is the primary and
//!   `CAMERA1_SOURCE_SVC ..= CAMERA{CAMERA_COUNT}_SOURCE_SVC` the secondaries,
//!   all on port 80.

use std::collections::BTreeMap;

use contracts::{ContractError, DiscoveryResult, Endpoint, ProducerDiscovery};

use crate::error::{DiscoveryError, Result};

const LEGACY_PORT: u16 = 80;
const SERVICE_HOST_SUFFIX: &str = "_SERVICE_HOST";

/// Variable prefix for a configuration name
pub fn env_prefix(configuration_name: &str) -> String {
    format!("{configuration_name}-").to_uppercase().replace('-', "_")
}

/// Discovers producers from environment variables
#[derive(Debug, Clone)]
pub struct EnvDiscovery {
    configuration_name: Option<String>,
    port_name: String,
    vars: Option<BTreeMap<String, String>>,
}

impl EnvDiscovery {
    /// Read the process environment on every cycle
    pub fn new(configuration_name: Option<String>, port_name: impl Into<String>) -> Self {
        Self {
            configuration_name,
            port_name: port_name.into(),
            vars: None,
        }
    }

    /// Use a fixed variable set instead of the process environment
    pub fn with_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        );
        self
    }

    fn snapshot(&self) -> BTreeMap<String, String> {
        match &self.vars {
            Some(vars) => vars.clone(),
            None => std::env::vars().collect(),
        }
    }

    /// Resolve the producer set from the current environment
    pub fn resolve(&self) -> Result<DiscoveryResult> {
        let vars = self.snapshot();
        match &self.configuration_name {
            Some(name) => resolve_configuration(&vars, name, &self.port_name),
            None => resolve_legacy(&vars),
        }
    }
}

fn require<'a>(vars: &'a BTreeMap<String, String>, name: &str) -> Result<&'a str> {
    vars.get(name)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DiscoveryError::missing(name))
}

fn endpoint(var: &str, host: &str, port: u16) -> Result<Endpoint> {
    Endpoint::from_parts(host, port).map_err(|e| DiscoveryError::invalid(var, e.to_string()))
}

fn resolve_configuration(
    vars: &BTreeMap<String, String>,
    configuration_name: &str,
    port_name: &str,
) -> Result<DiscoveryResult> {
    let prefix = env_prefix(configuration_name);
    let service_prefix = format!("{prefix}SVC_SERVICE_");

    let port_var = format!("{service_prefix}PORT_{port_name}");
    let port: u16 = require(vars, &port_var)?
        .parse()
        .map_err(|_| DiscoveryError::invalid(&port_var, "not a port number"))?;

    let primary_var = format!("{service_prefix}HOST");
    let primary = match vars.get(&primary_var) {
        Some(host) if !host.trim().is_empty() => Some(endpoint(&primary_var, host.trim(), port)?),
        _ => None,
    };

    let secondaries = vars
        .iter()
        .filter(|(k, _)| {
            k.starts_with(&prefix)
                && !k.starts_with(&service_prefix)
                && k.ends_with(SERVICE_HOST_SUFFIX)
        })
        .map(|(k, host)| endpoint(k, host.trim(), port))
        .collect::<Result<Vec<_>>>()?;

    Ok(DiscoveryResult::new(primary, secondaries))
}

fn resolve_legacy(vars: &BTreeMap<String, String>) -> Result<DiscoveryResult> {
    let count: usize = require(vars, "CAMERA_COUNT")?
        .parse()
        .map_err(|_| DiscoveryError::invalid("CAMERA_COUNT", "not a number"))?;

    let primary_host = require(vars, "CAMERAS_SOURCE_SVC")?;
    let primary = endpoint("CAMERAS_SOURCE_SVC", primary_host, LEGACY_PORT)?;

    let secondaries = (1..=count)
        .map(|i| {
            let var = format!("CAMERA{i}_SOURCE_SVC");
            let host = require(vars, &var)?;
            endpoint(&var, host, LEGACY_PORT)
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(DiscoveryResult::new(Some(primary), secondaries))
}

impl ProducerDiscovery for EnvDiscovery {
    fn name(&self) -> &str {
        "env"
    }

    async fn list_producers(&self) -> std::result::Result<DiscoveryResult, ContractError> {
        self.resolve().map_err(|e| e.into_contract("env"))
    }
}
