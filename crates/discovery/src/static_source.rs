//! Static producer list fixed at startup

use contracts::{ContractError, DiscoveryResult, Endpoint, ProducerDiscovery};

/// Returns the same producer set on every cycle
#[derive(Debug, Clone, Default)]
pub struct StaticDiscovery {
    result: DiscoveryResult,
}

impl StaticDiscovery {
    /// Create from a primary and secondaries (sorted and de-duplicated)
    pub fn new(primary: Option<Endpoint>, secondaries: Vec<Endpoint>) -> Self {
        Self {
            result: DiscoveryResult::new(primary, secondaries),
        }
    }
}

impl ProducerDiscovery for StaticDiscovery {
    fn name(&self) -> &str {
        "static"
    }

    async fn list_producers(&self) -> Result<DiscoveryResult, ContractError> {
        Ok(self.result.clone())
    }
}
