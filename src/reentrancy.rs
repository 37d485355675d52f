//! Blocking host calls from inside coroutines.

use scriptbridge_core::{CallContext, ExecutionState};

use crate::error::BridgeError;

/// The fixed diagnostic ending every reentrancy error.
pub const REENTRANCY_MESSAGE: &str = "host functions cannot be called from inside a coroutine";

/// Admits or vetoes a host call based on the caller's execution state.
///
/// The guard carries no state of its own beyond what it reads from the
/// calling context, so it can be built per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReentrancyGuard {
    state: ExecutionState,
}

impl ReentrancyGuard {
    pub fn new(state: ExecutionState) -> Self {
        Self { state }
    }

    pub fn for_context(ctx: &CallContext<'_>) -> Self {
        Self::new(ctx.execution_state())
    }

    pub fn state(&self) -> ExecutionState {
        self.state
    }

    /// Fails with [`BridgeError::Reentrancy`] when inside a coroutine.
    pub fn admit(&self, function: &str) -> Result<(), BridgeError> {
        if self.state.is_in_coroutine() {
            tracing::warn!(function, "host call rejected inside coroutine");
            return Err(BridgeError::Reentrancy {
                function: function.to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normal_state_admits() {
        assert!(ReentrancyGuard::new(ExecutionState::Normal).admit("f").is_ok());
    }

    #[test]
    fn test_coroutine_state_rejects() {
        let guard = ReentrancyGuard::new(ExecutionState::Normal.enter_coroutine());
        let err = guard.admit("f").unwrap_err();
        assert!(err.is_reentrancy());
        assert!(err.to_string().ends_with(REENTRANCY_MESSAGE));
    }
}
