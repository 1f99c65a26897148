//! Scripted discovery for tests and demos
//!
//! Clones share state: a test keeps one handle to change what the
//! reconciler's handle returns next.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{ContractError, DiscoveryResult, ProducerDiscovery};

#[derive(Debug, Default)]
struct ScriptState {
    current: DiscoveryResult,
    failure: Option<String>,
    calls: u64,
}

/// Discovery source whose answer is set by hand
#[derive(Debug, Clone, Default)]
pub struct ScriptedDiscovery {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedDiscovery {
    /// Start out returning `initial`
    pub fn new(initial: DiscoveryResult) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                current: initial.normalized(),
                ..Default::default()
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, ScriptState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the result returned from the next cycle on
    pub fn set(&self, result: DiscoveryResult) {
        self.state().current = result.normalized();
    }

    /// Fail every query with `message` until `recover` is called
    pub fn fail(&self, message: impl Into<String>) {
        self.state().failure = Some(message.into());
    }

    /// Stop failing
    pub fn recover(&self) {
        self.state().failure = None;
    }

    /// Number of queries answered so far
    pub fn calls(&self) -> u64 {
        self.state().calls
    }
}

impl ProducerDiscovery for ScriptedDiscovery {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn list_producers(&self) -> Result<DiscoveryResult, ContractError> {
        let mut state = self.state();
        state.calls += 1;
        match &state.failure {
            Some(message) => Err(ContractError::discovery("scripted", message.clone())),
            None => Ok(state.current.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Endpoint;

    #[tokio::test]
    async fn test_clones_share_script() {
        let ep = |s: &str| Endpoint::parse(s).unwrap();
        let script = ScriptedDiscovery::new(DiscoveryResult::new(Some(ep("a:1")), vec![]));
        let handle = script.clone();

        assert_eq!(script.list_producers().await.unwrap().producer_count(), 1);

        handle.set(DiscoveryResult::new(Some(ep("a:1")), vec![ep("b:1")]));
        assert_eq!(script.list_producers().await.unwrap().producer_count(), 2);

        handle.fail("registry down");
        assert!(script.list_producers().await.is_err());

        handle.recover();
        assert!(script.list_producers().await.is_ok());
        assert_eq!(handle.calls(), 4);
    }
}
