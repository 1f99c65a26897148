//! Configuration validation
//!
//! Rules:
//! - server.bind is a socket address
//! - multipart boundary is a non-empty token (RFC 2046, at most 70 chars)
//! - static secondaries are unique and do not repeat the primary
//! - file/env discovery parameters are non-empty
//! - every interval and timeout > 0

use std::collections::HashSet;
use std::net::SocketAddr;

use contracts::{ContractError, DiscoveryConfig, RelayBlueprint};

const MAX_BOUNDARY_LEN: usize = 70;

/// Validate a RelayBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    validate_server(blueprint)?;
    validate_discovery(blueprint)?;
    validate_reconcile(blueprint)?;
    validate_fetch(blueprint)?;
    Ok(())
}

/// Validate HTTP surface
fn validate_server(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let server = &blueprint.server;

    server.bind.parse::<SocketAddr>().map_err(|e| {
        ContractError::config_validation(
            "server.bind",
            format!("'{}' is not a socket address: {e}", server.bind),
        )
    })?;

    let boundary = &server.boundary;
    if boundary.is_empty() || boundary.len() > MAX_BOUNDARY_LEN {
        return Err(ContractError::config_validation(
            "server.boundary",
            format!("boundary must be 1..={MAX_BOUNDARY_LEN} characters"),
        ));
    }
    if !boundary.chars().all(|c| c.is_ascii_graphic()) {
        return Err(ContractError::config_validation(
            "server.boundary",
            "boundary must be printable ASCII without whitespace",
        ));
    }

    if server.content_type.trim().is_empty() {
        return Err(ContractError::config_validation(
            "server.content_type",
            "content_type cannot be empty",
        ));
    }

    Ok(())
}

/// Validate discovery source parameters
fn validate_discovery(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    match &blueprint.discovery {
        DiscoveryConfig::Static {
            primary,
            secondaries,
        } => {
            let mut seen = HashSet::new();
            for (idx, endpoint) in secondaries.iter().enumerate() {
                if !seen.insert(endpoint) {
                    return Err(ContractError::config_validation(
                        format!("discovery.secondaries[{idx}]"),
                        format!("duplicate endpoint '{endpoint}'"),
                    ));
                }
                if primary.as_ref() == Some(endpoint) {
                    return Err(ContractError::config_validation(
                        format!("discovery.secondaries[{idx}]"),
                        format!("endpoint '{endpoint}' is already the primary"),
                    ));
                }
            }
        }
        DiscoveryConfig::File { path } => {
            if path.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "discovery.path",
                    "registry path cannot be empty",
                ));
            }
        }
        DiscoveryConfig::Env {
            configuration_name,
            port_name,
        } => {
            if configuration_name
                .as_deref()
                .is_some_and(|name| name.trim().is_empty())
            {
                return Err(ContractError::config_validation(
                    "discovery.configuration_name",
                    "configuration_name cannot be empty when set",
                ));
            }
            if port_name.trim().is_empty() {
                return Err(ContractError::config_validation(
                    "discovery.port_name",
                    "port_name cannot be empty",
                ));
            }
        }
    }
    Ok(())
}

/// Validate reconciliation cadence
fn validate_reconcile(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    if blueprint.reconcile.interval_ms == 0 {
        return Err(ContractError::config_validation(
            "reconcile.interval_ms",
            "interval_ms must be > 0",
        ));
    }
    Ok(())
}

/// Validate fetch behaviour
fn validate_fetch(blueprint: &RelayBlueprint) -> Result<(), ContractError> {
    let fetch = &blueprint.fetch;

    let durations = [
        ("fetch.timeout_ms", fetch.timeout_ms),
        ("fetch.poll_interval_ms", fetch.poll_interval_ms),
        ("fetch.retry_interval_ms", fetch.retry_interval_ms.unwrap_or(1)),
    ];
    for (field, value) in durations {
        if value == 0 {
            return Err(ContractError::config_validation(field, "must be > 0"));
        }
    }

    if !fetch.path.starts_with('/') {
        return Err(ContractError::config_validation(
            "fetch.path",
            format!("path must start with '/', got '{}'", fetch.path),
        ));
    }

    Ok(())
}
