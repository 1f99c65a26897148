//! ProducerDiscovery trait - Discovery source abstraction
//!
//! The relay never talks to a registry directly; it asks a `ProducerDiscovery`
//! for a snapshot once per reconciliation period. Static lists, registry files
//! and service environment conventions all implement the same trait.

use serde::{Deserialize, Serialize};

use crate::{ContractError, Endpoint};

/// Snapshot of the producers a discovery source currently reports.
///
/// Transient: lives for one reconciliation cycle only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveryResult {
    /// Primary producer, if the source knows one
    #[serde(default)]
    pub primary: Option<Endpoint>,

    /// Secondary producers
    #[serde(default)]
    pub secondaries: Vec<Endpoint>,
}

impl DiscoveryResult {
    /// Create a snapshot; secondaries are sorted and de-duplicated.
    pub fn new(primary: Option<Endpoint>, secondaries: Vec<Endpoint>) -> Self {
        Self {
            primary,
            secondaries,
        }
        .normalized()
    }

    /// Sort secondaries by value and drop duplicates.
    pub fn normalized(mut self) -> Self {
        self.secondaries.sort();
        self.secondaries.dedup();
        self
    }

    /// Number of stream indices this snapshot would expose
    pub fn producer_count(&self) -> usize {
        usize::from(self.primary.is_some()) + self.secondaries.len()
    }

    /// Label in `primary+sec1,sec2` form used by UI refresh checks
    pub fn label(&self) -> String {
        let secondaries = self
            .secondaries
            .iter()
            .map(Endpoint::as_str)
            .collect::<Vec<_>>()
            .join(",");
        match &self.primary {
            Some(primary) => format!("{primary}+{secondaries}"),
            None => secondaries,
        }
    }
}

/// Discovery source trait
///
/// `list_producers` is called once per reconciliation period. An error leaves
/// the current producer set untouched; implementations must not return a
/// partial snapshot on failure.
#[trait_variant::make(ProducerDiscovery: Send)]
pub trait LocalProducerDiscovery {
    /// Source name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Query the current producer snapshot
    ///
    /// # Errors
    /// Returns a discovery error when the source is unreachable or unreadable
    async fn list_producers(&self) -> Result<DiscoveryResult, ContractError>;
}
