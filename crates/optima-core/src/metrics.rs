// crates/optima-core/src/metrics.rs
//
// Per-validator telemetry and network-wide aggregate metrics.
//
// Gauge bounds below define the random-walk envelopes used by the
// simulator's metrics tick:
//   - CPU:      5% .. 100%, step +/- 5
//   - Memory:  10% .. 100%, step +/- 3
//   - Disk:    20% .. 100%, step +/- 0.1
//   - Peers:   floor 5, nudged by one
//   - Latency: floor 5 ms, step +/- 5

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::identity::{ValidatorId, ValidatorIdentity};

/// CPU usage envelope (percent).
pub const CPU_RANGE: (f64, f64) = (5.0, 100.0);
/// Maximum CPU change per metrics tick.
pub const CPU_STEP: f64 = 5.0;

/// Memory usage envelope (percent).
pub const MEMORY_RANGE: (f64, f64) = (10.0, 100.0);
/// Maximum memory change per metrics tick.
pub const MEMORY_STEP: f64 = 3.0;

/// Disk usage envelope (percent).
pub const DISK_RANGE: (f64, f64) = (20.0, 100.0);
/// Maximum disk change per metrics tick.
pub const DISK_STEP: f64 = 0.1;

/// Lowest peer count a validator can drift to.
pub const MIN_PEERS: u32 = 5;

/// Lowest latency (ms) a validator can drift to.
pub const MIN_LATENCY_MS: f64 = 5.0;
/// Maximum latency change per metrics tick.
pub const LATENCY_STEP_MS: f64 = 5.0;

/// Uptime a fresh validator starts with (percent).
pub const INITIAL_UPTIME: f64 = 100.0;
/// Uptime never decays below this floor (percent).
pub const MIN_UPTIME: f64 = 99.0;

/// Activity status reported for a validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidatorStatus {
    Active,
    Inactive,
}

/// Cumulative bandwidth counters (KB).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bandwidth {
    pub inbound_kb: u64,
    pub outbound_kb: u64,
}

/// Telemetry owned by a single validator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorMetrics {
    /// Blocks this validator proposed itself.
    pub blocks_proposed: u64,
    /// Blocks this validator has validated (one per block tick).
    pub blocks_validated: u64,
    /// Transactions seen across all validated blocks.
    pub transactions: u64,
    /// Unix ms of the last produced block (creation time before the first).
    pub last_block_time_ms: u64,
    /// Connected peer count.
    pub peers: u32,
    /// Network latency in milliseconds.
    pub latency_ms: f64,
    /// CPU usage percent.
    pub cpu_usage: f64,
    /// Memory usage percent.
    pub memory_usage: f64,
    /// Disk usage percent.
    pub disk_usage: f64,
    pub bandwidth: Bandwidth,
}

impl ValidatorMetrics {
    /// Fresh metrics: zeroed counters, randomized peers and latency, resource
    /// gauges at the bottom of their envelopes.
    pub fn new<R: Rng + ?Sized>(rng: &mut R, now_ms: u64) -> Self {
        Self {
            blocks_proposed: 0,
            blocks_validated: 0,
            transactions: 0,
            last_block_time_ms: now_ms,
            peers: rng.gen_range(10..60),
            latency_ms: rng.gen_range(10..110) as f64,
            cpu_usage: CPU_RANGE.0,
            memory_usage: MEMORY_RANGE.0,
            disk_usage: DISK_RANGE.0,
            bandwidth: Bandwidth::default(),
        }
    }
}

/// Summary projection of a validator, as listed by the network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorInfo {
    pub id: ValidatorId,
    pub moniker: String,
    pub voting_power: u64,
    pub commission_rate: f64,
    pub uptime: f64,
    pub status: ValidatorStatus,
    pub peers: u32,
    pub blocks_proposed: u64,
    pub blocks_validated: u64,
    pub transactions: u64,
}

impl ValidatorInfo {
    pub fn new(
        identity: &ValidatorIdentity,
        uptime: f64,
        status: ValidatorStatus,
        metrics: &ValidatorMetrics,
    ) -> Self {
        Self {
            id: identity.id.clone(),
            moniker: identity.moniker.clone(),
            voting_power: identity.voting_power,
            commission_rate: identity.commission_rate,
            uptime,
            status,
            peers: metrics.peers,
            blocks_proposed: metrics.blocks_proposed,
            blocks_validated: metrics.blocks_validated,
            transactions: metrics.transactions,
        }
    }
}

/// Full projection of a validator including every metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidatorDetail {
    pub id: ValidatorId,
    pub moniker: String,
    pub voting_power: u64,
    pub commission_rate: f64,
    pub uptime: f64,
    pub status: ValidatorStatus,
    pub metrics: ValidatorMetrics,
}

impl ValidatorDetail {
    pub fn new(
        identity: &ValidatorIdentity,
        uptime: f64,
        status: ValidatorStatus,
        metrics: &ValidatorMetrics,
    ) -> Self {
        Self {
            id: identity.id.clone(),
            moniker: identity.moniker.clone(),
            voting_power: identity.voting_power,
            commission_rate: identity.commission_rate,
            uptime,
            status,
            metrics: metrics.clone(),
        }
    }
}

/// Network-wide metrics recomputed by the aggregation tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkAggregateMetrics {
    /// Transactions per second over the last aggregation interval.
    pub tps: f64,
    /// Height of the most recently received block.
    pub block_height: u64,
    /// Unix ms of the most recently received block.
    pub last_block_time_ms: u64,
    /// Elapsed ms since initialization divided by consensus rounds.
    pub average_block_time_ms: f64,
    pub active_validators: usize,
    pub total_validators: usize,
    /// Sum of voting power, fixed at initialization.
    pub total_stake: u64,
    /// Mean uptime over running validators.
    pub network_uptime: f64,
    /// Block events observed network-wide.
    pub consensus_rounds: u64,
    pub total_transactions: u64,
    /// Whole seconds since initialization.
    pub running_time_secs: u64,
}

impl NetworkAggregateMetrics {
    /// Metrics of a network that has not produced anything yet.
    pub fn new(block_time_ms: u64) -> Self {
        Self {
            tps: 0.0,
            block_height: 0,
            last_block_time_ms: 0,
            average_block_time_ms: block_time_ms as f64,
            active_validators: 0,
            total_validators: 0,
            total_stake: 0,
            network_uptime: INITIAL_UPTIME,
            consensus_rounds: 0,
            total_transactions: 0,
            running_time_secs: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_metrics_within_envelopes() {
        let mut rng = StdRng::seed_from_u64(3);
        let m = ValidatorMetrics::new(&mut rng, 1_000);
        assert_eq!(m.blocks_validated, 0);
        assert_eq!(m.last_block_time_ms, 1_000);
        assert!((10..60).contains(&m.peers));
        assert!(m.latency_ms >= 10.0 && m.latency_ms < 110.0);
        assert_eq!(m.cpu_usage, CPU_RANGE.0);
        assert_eq!(m.bandwidth, Bandwidth::default());
    }

    #[test]
    fn test_status_serializes_lowercase() {
        let json = serde_json::to_string(&ValidatorStatus::Active).unwrap();
        assert_eq!(json, "\"active\"");
        let json = serde_json::to_string(&ValidatorStatus::Inactive).unwrap();
        assert_eq!(json, "\"inactive\"");
    }

    #[test]
    fn test_aggregate_defaults() {
        let m = NetworkAggregateMetrics::new(2000);
        assert_eq!(m.average_block_time_ms, 2000.0);
        assert_eq!(m.network_uptime, INITIAL_UPTIME);
        assert_eq!(m.consensus_rounds, 0);
    }
}
