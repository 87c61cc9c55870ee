// crates/optima-core/src/config.rs
//
// Construction parameters for a validator network.
//
// Only the three fields below are honored; anything else about the network
// (aggregation interval, metrics tick) is fixed.

use serde::{Deserialize, Serialize};

use crate::error::OptimaError;

/// Parameters a `ValidatorNetwork` is built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Size of the validator pool. Fixed after initialization.
    #[serde(default = "default_validator_count")]
    pub validator_count: usize,

    /// How many validators (from the front of the pool) start active.
    #[serde(default = "default_active_validators")]
    pub active_validators: usize,

    /// Block tick interval in milliseconds.
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,
}

fn default_validator_count() -> usize {
    100
}

fn default_active_validators() -> usize {
    50
}

fn default_block_time_ms() -> u64 {
    2000
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            validator_count: default_validator_count(),
            active_validators: default_active_validators(),
            block_time_ms: default_block_time_ms(),
        }
    }
}

impl NetworkConfig {
    pub fn new(validator_count: usize, active_validators: usize, block_time_ms: u64) -> Self {
        Self {
            validator_count,
            active_validators,
            block_time_ms,
        }
    }

    /// Reject parameters that would produce a degenerate network.
    ///
    /// # Errors
    /// Returns `OptimaError::InvalidConfig` if `validator_count` or
    /// `block_time_ms` is zero, or if more validators are asked to start than
    /// exist.
    pub fn validate(&self) -> Result<(), OptimaError> {
        if self.validator_count == 0 {
            return Err(OptimaError::InvalidConfig(
                "validator_count must be positive".to_string(),
            ));
        }
        if self.block_time_ms == 0 {
            return Err(OptimaError::InvalidConfig(
                "block_time_ms must be positive".to_string(),
            ));
        }
        if self.active_validators > self.validator_count {
            return Err(OptimaError::InvalidConfig(format!(
                "active_validators ({}) exceeds validator_count ({})",
                self.active_validators, self.validator_count
            )));
        }
        Ok(())
    }
}
