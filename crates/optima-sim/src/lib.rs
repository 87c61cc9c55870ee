// crates/optima-sim/src/lib.rs
//
// optima-sim: Validator-network simulator for OptimaChain.
//
// A `ValidatorNetwork` owns a fixed pool of `ValidatorNode`s. Every periodic
// task (per-node block tick, per-node metrics tick, network aggregation tick)
// is a timer in a single `TickScheduler`, fired in deterministic order
// against an injected `Clock`.

pub mod network;
pub mod node;
pub mod scheduler;
pub mod state;

pub use network::{ValidatorNetwork, AGGREGATION_INTERVAL_MS, NO_RUNNING_UPTIME};
pub use node::{ValidatorNode, METRICS_INTERVAL_MS};
pub use scheduler::{DueTick, TickScheduler, TickTarget, TimerHandle};
pub use state::NetworkLifecycle;
