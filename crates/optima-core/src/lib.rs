// crates/optima-core/src/lib.rs
//
// optima-core: Core types, events, and primitives for the OptimaChain
// validator-network simulator.
//
// This is the leaf crate that the simulator and daemon depend on. It defines
// the validator data model, the typed event stream, the clock abstraction,
// block hashing, network construction config, and the error type.

pub mod clock;
pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod identity;
pub mod metrics;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use optima_core::ValidatorId;`

// Identity types
pub use identity::{ValidatorId, ValidatorIdentity};

// Metric types
pub use metrics::{
    Bandwidth, NetworkAggregateMetrics, ValidatorDetail, ValidatorInfo, ValidatorMetrics,
    ValidatorStatus,
};

// Event types
pub use events::{BlockEvent, NetworkBlock, NetworkEvent, NodeEvent};

// Clock types
pub use clock::{Clock, ManualClock, SystemClock};

// Config
pub use config::NetworkConfig;

// Error type
pub use error::OptimaError;
