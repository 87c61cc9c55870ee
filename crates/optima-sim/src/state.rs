// crates/optima-sim/src/state.rs
//
// Lifecycle state machine for the validator network.
//
// Valid transitions:
//   Uninitialized -> Initialized -> Shutdown
//
// Shutdown is terminal.

use std::fmt;

use serde::{Deserialize, Serialize};

use optima_core::OptimaError;

/// Lifecycle states of a validator network.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkLifecycle {
    /// Constructed, no validators created yet.
    #[default]
    Uninitialized,
    /// Validator pool exists and the aggregation tick is running.
    Initialized,
    /// All validators stopped; no further ticks.
    Shutdown,
}

impl fmt::Display for NetworkLifecycle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetworkLifecycle::Uninitialized => write!(f, "Uninitialized"),
            NetworkLifecycle::Initialized => write!(f, "Initialized"),
            NetworkLifecycle::Shutdown => write!(f, "Shutdown"),
        }
    }
}

impl NetworkLifecycle {
    /// Attempt to move to `next`.
    ///
    /// Returns `OptimaError::InvalidState` if the transition is not valid.
    pub fn transition(&mut self, next: NetworkLifecycle) -> Result<(), OptimaError> {
        let valid = matches!(
            (*self, next),
            (NetworkLifecycle::Uninitialized, NetworkLifecycle::Initialized)
                | (NetworkLifecycle::Initialized, NetworkLifecycle::Shutdown)
        );

        if valid {
            tracing::info!("Network state transition: {} -> {}", self, next);
            *self = next;
            Ok(())
        } else {
            Err(OptimaError::InvalidState(format!(
                "Invalid network state transition: {} -> {}",
                self, next
            )))
        }
    }

    pub fn is_initialized(&self) -> bool {
        *self == NetworkLifecycle::Initialized
    }
}
