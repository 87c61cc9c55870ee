// crates/optima-core/src/events.rs
//
// Typed events emitted by validator nodes and by the network.
//
// Nodes produce `NodeEvent`s; the network consumes them inline, updates its
// aggregate counters, and republishes a `NetworkEvent` stream for dashboards.

use serde::{Deserialize, Serialize};

use crate::identity::ValidatorId;
use crate::metrics::{NetworkAggregateMetrics, ValidatorDetail};

/// A simulated block produced by one validator's block tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEvent {
    /// `floor(timestamp / block_time)`; a shared clock basis, not a ledger.
    pub height: u64,
    /// Hex SHA-256 of `"{validator_id}-{height}"`.
    pub hash: String,
    pub transaction_count: u64,
    pub timestamp_ms: u64,
    /// The emitting validator on a self-proposal, a random id otherwise.
    pub proposer_id: ValidatorId,
}

/// Events emitted by a single validator node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeEvent {
    Started {
        id: ValidatorId,
        moniker: String,
    },
    Stopped {
        id: ValidatorId,
        moniker: String,
    },
    Block {
        id: ValidatorId,
        block: BlockEvent,
    },
    Metrics {
        id: ValidatorId,
        detail: ValidatorDetail,
    },
}

/// A block as republished by the network, enriched with the display name of
/// the validator that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkBlock {
    #[serde(flatten)]
    pub block: BlockEvent,
    pub proposer_moniker: String,
}

/// Events emitted by the validator network.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetworkEvent {
    /// The validator pool was created and the initial subset started.
    Initialized {
        validators: usize,
        active_validators: usize,
        total_stake: u64,
    },
    /// Every validator was stopped and aggregation ended.
    Shutdown,
    Block(NetworkBlock),
    /// Aggregate metrics sampled by the aggregation tick.
    Metrics(NetworkAggregateMetrics),
    /// Per-validator metrics passthrough.
    ValidatorMetrics(ValidatorDetail),
}

impl NetworkEvent {
    /// Short event name, matching the serialized `type` tag.
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkEvent::Initialized { .. } => "initialized",
            NetworkEvent::Shutdown => "shutdown",
            NetworkEvent::Block(_) => "block",
            NetworkEvent::Metrics(_) => "metrics",
            NetworkEvent::ValidatorMetrics(_) => "validator_metrics",
        }
    }
}
