// crates/optima-core/src/error.rs
//
// Error types for the OptimaChain simulator.

use thiserror::Error;

/// Error types for the OptimaChain validator simulator.
#[derive(Debug, Error)]
pub enum OptimaError {
    /// Construction parameters that would produce a degenerate network.
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    /// Invalid lifecycle transition (e.g. initializing twice).
    #[error("Invalid state: {0}")]
    InvalidState(String),
}
