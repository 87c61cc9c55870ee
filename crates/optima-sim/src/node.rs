// crates/optima-sim/src/node.rs
//
// ValidatorNode: one simulated validator.
//
// Lifecycle: Inactive -> Active -> Inactive, via start()/stop(). Both are
// idempotent; a running node holds exactly two armed timers (block tick,
// metrics tick) and a stopped node holds none.
//
// Every operation returns the event it emits instead of calling listeners,
// so the owning network decides how events are delivered.

use rand::rngs::StdRng;
use rand::Rng;

use optima_core::crypto::block_hash;
use optima_core::metrics::{
    CPU_RANGE, CPU_STEP, DISK_RANGE, DISK_STEP, INITIAL_UPTIME, LATENCY_STEP_MS, MEMORY_RANGE,
    MEMORY_STEP, MIN_LATENCY_MS, MIN_PEERS, MIN_UPTIME,
};
use optima_core::{
    BlockEvent, NodeEvent, ValidatorDetail, ValidatorId, ValidatorIdentity, ValidatorInfo,
    ValidatorMetrics, ValidatorStatus,
};

use crate::scheduler::{TickScheduler, TickTarget, TimerHandle};

/// Interval of the resource telemetry tick.
pub const METRICS_INTERVAL_MS: u64 = 1000;

/// Chance that a block tick is a self-proposal.
const SELF_PROPOSAL_PROBABILITY: f64 = 0.10;
/// Chance that a block tick decays uptime.
const UPTIME_DECAY_PROBABILITY: f64 = 0.01;
/// Largest uptime decay per event (percentage points).
const MAX_UPTIME_DECAY: f64 = 0.1;
/// Chance that a metrics tick changes the peer count.
const PEER_CHANGE_PROBABILITY: f64 = 0.10;

/// A simulated validator with its own telemetry and timers.
#[derive(Debug)]
pub struct ValidatorNode {
    /// Position in the owning network's pool; used as the timer target.
    index: usize,
    identity: ValidatorIdentity,
    metrics: ValidatorMetrics,
    uptime: f64,
    status: ValidatorStatus,
    running: bool,
    block_time_ms: u64,
    block_timer: Option<TimerHandle>,
    metrics_timer: Option<TimerHandle>,
    rng: StdRng,
}

impl ValidatorNode {
    /// Create an inactive node. `block_time_ms` is clamped to at least 1.
    pub fn new(
        index: usize,
        identity: ValidatorIdentity,
        block_time_ms: u64,
        mut rng: StdRng,
        now_ms: u64,
    ) -> Self {
        let metrics = ValidatorMetrics::new(&mut rng, now_ms);
        Self {
            index,
            identity,
            metrics,
            uptime: INITIAL_UPTIME,
            status: ValidatorStatus::Inactive,
            running: false,
            block_time_ms: block_time_ms.max(1),
            block_timer: None,
            metrics_timer: None,
            rng,
        }
    }

    /// Arm the block and metrics ticks and mark the node active.
    ///
    /// Returns `None` without touching the scheduler if already running.
    pub fn start(&mut self, scheduler: &mut TickScheduler, now_ms: u64) -> Option<NodeEvent> {
        if self.running {
            return None;
        }

        self.running = true;
        self.status = ValidatorStatus::Active;
        self.block_timer = Some(scheduler.schedule(
            TickTarget::Block(self.index),
            self.block_time_ms,
            now_ms,
        ));
        self.metrics_timer = Some(scheduler.schedule(
            TickTarget::Metrics(self.index),
            METRICS_INTERVAL_MS,
            now_ms,
        ));

        tracing::debug!("Validator {} started", self.identity.moniker);
        Some(NodeEvent::Started {
            id: self.identity.id.clone(),
            moniker: self.identity.moniker.clone(),
        })
    }

    /// Cancel both ticks and mark the node inactive.
    ///
    /// Returns `None` without touching the scheduler if already stopped.
    pub fn stop(&mut self, scheduler: &mut TickScheduler) -> Option<NodeEvent> {
        if !self.running {
            return None;
        }

        self.running = false;
        self.status = ValidatorStatus::Inactive;
        for handle in [self.block_timer.take(), self.metrics_timer.take()]
            .into_iter()
            .flatten()
        {
            scheduler.cancel(handle);
        }

        tracing::debug!("Validator {} stopped", self.identity.moniker);
        Some(NodeEvent::Stopped {
            id: self.identity.id.clone(),
            moniker: self.identity.moniker.clone(),
        })
    }

    /// Block tick: produce one simulated block at `now_ms`.
    pub fn simulate_block_production(&mut self, now_ms: u64) -> NodeEvent {
        let height = now_ms / self.block_time_ms;
        let transaction_count = self.rng.gen_range(1..=100u64);
        let self_proposed = self.rng.gen_bool(SELF_PROPOSAL_PROBABILITY);

        if self_proposed {
            self.metrics.blocks_proposed += 1;
        }
        self.metrics.blocks_validated += 1;
        self.metrics.transactions += transaction_count;
        self.metrics.last_block_time_ms = now_ms;

        self.metrics.bandwidth.inbound_kb += self.rng.gen_range(100..600);
        self.metrics.bandwidth.outbound_kb += self.rng.gen_range(200..1200);

        if self.rng.gen_bool(UPTIME_DECAY_PROBABILITY) {
            let decay = self.rng.gen_range(0.0..MAX_UPTIME_DECAY);
            self.uptime = (self.uptime - decay).max(MIN_UPTIME);
        }

        let proposer_id = if self_proposed {
            self.identity.id.clone()
        } else {
            ValidatorId::random(&mut self.rng)
        };

        NodeEvent::Block {
            id: self.identity.id.clone(),
            block: BlockEvent {
                height,
                hash: block_hash(&self.identity.id, height),
                transaction_count,
                timestamp_ms: now_ms,
                proposer_id,
            },
        }
    }

    /// Metrics tick: random-walk the resource gauges within their envelopes.
    pub fn update_system_metrics(&mut self) -> NodeEvent {
        let m = &mut self.metrics;
        m.cpu_usage = random_walk(&mut self.rng, m.cpu_usage, CPU_STEP, CPU_RANGE);
        m.memory_usage = random_walk(&mut self.rng, m.memory_usage, MEMORY_STEP, MEMORY_RANGE);
        m.disk_usage = random_walk(&mut self.rng, m.disk_usage, DISK_STEP, DISK_RANGE);

        if self.rng.gen_bool(PEER_CHANGE_PROBABILITY) {
            m.peers = if self.rng.gen_bool(0.5) {
                m.peers + 1
            } else {
                m.peers.saturating_sub(1).max(MIN_PEERS)
            };
        }

        let delta = self.rng.gen_range(-LATENCY_STEP_MS..LATENCY_STEP_MS);
        m.latency_ms = (m.latency_ms + delta).max(MIN_LATENCY_MS);

        NodeEvent::Metrics {
            id: self.identity.id.clone(),
            detail: self.get_metrics(),
        }
    }

    /// Full snapshot: identity, uptime, status and every metric.
    pub fn get_metrics(&self) -> ValidatorDetail {
        ValidatorDetail::new(&self.identity, self.uptime, self.status, &self.metrics)
    }

    /// Summary snapshot.
    pub fn get_info(&self) -> ValidatorInfo {
        ValidatorInfo::new(&self.identity, self.uptime, self.status, &self.metrics)
    }

    pub fn id(&self) -> &ValidatorId {
        &self.identity.id
    }

    pub fn moniker(&self) -> &str {
        &self.identity.moniker
    }

    pub fn metrics(&self) -> &ValidatorMetrics {
        &self.metrics
    }

    pub fn uptime(&self) -> f64 {
        self.uptime
    }

    pub fn status(&self) -> ValidatorStatus {
        self.status
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}

fn random_walk(rng: &mut StdRng, value: f64, step: f64, (min, max): (f64, f64)) -> f64 {
    (value + rng.gen_range(-step..step)).clamp(min, max)
}
