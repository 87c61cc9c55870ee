// crates/optima-sim/src/network.rs
//
// ValidatorNetwork: owns the validator pool, aggregates per-node events into
// network-wide metrics, and republishes a unified event stream.
//
// Lifecycle: Uninitialized -> Initialized -> Shutdown (terminal).
//
// All ticks run from one `TickScheduler` against the injected clock, in
// deterministic order, when `advance()` is called. Node events are handled
// inline as they are produced, then published on tokio broadcast channels:
// one for `NetworkEvent`s and one for raw `NodeEvent`s. A receiver that falls
// behind by more than the channel capacity loses the oldest events; it never
// stalls a tick.

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::broadcast;

use optima_core::{
    BlockEvent, Clock, NetworkAggregateMetrics, NetworkBlock, NetworkConfig, NetworkEvent,
    NodeEvent, OptimaError, ValidatorDetail, ValidatorId, ValidatorIdentity, ValidatorInfo,
};

use crate::node::ValidatorNode;
use crate::scheduler::{DueTick, TickScheduler, TickTarget, TimerHandle};
use crate::state::NetworkLifecycle;

/// Interval of the network aggregation tick.
pub const AGGREGATION_INTERVAL_MS: u64 = 1000;

/// Reported `network_uptime` when no validator is running.
pub const NO_RUNNING_UPTIME: f64 = 0.0;

/// Capacity of each broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Voting power drawn for each validator at initialization.
const VOTING_POWER_RANGE: std::ops::Range<u64> = 1_000..11_000;
/// Commission drawn for each validator at initialization.
const COMMISSION_RANGE: std::ops::Range<f64> = 0.0..0.2;

/// The simulated validator network.
pub struct ValidatorNetwork {
    config: NetworkConfig,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    lifecycle: NetworkLifecycle,
    validators: Vec<ValidatorNode>,
    scheduler: TickScheduler,
    aggregation_timer: Option<TimerHandle>,
    metrics: NetworkAggregateMetrics,
    /// Fixed at initialization.
    total_stake: u64,
    total_transactions: u64,
    /// `total_transactions` at the previous aggregation tick.
    last_tps_sample: u64,
    /// Time of the previous aggregation tick.
    last_sample_ms: u64,
    started_at_ms: u64,
    events: broadcast::Sender<NetworkEvent>,
    node_events: broadcast::Sender<NodeEvent>,
}

impl ValidatorNetwork {
    /// Create an uninitialized network with an entropy-seeded RNG.
    ///
    /// # Errors
    /// Returns `OptimaError::InvalidConfig` if the config is degenerate.
    pub fn new<C: Clock + 'static>(config: NetworkConfig, clock: C) -> Result<Self, OptimaError> {
        Self::build(config, Arc::new(clock), StdRng::from_entropy())
    }

    /// Create an uninitialized network whose ids, stakes and every random
    /// draw are reproducible from `seed`.
    ///
    /// # Errors
    /// Returns `OptimaError::InvalidConfig` if the config is degenerate.
    pub fn with_seed<C: Clock + 'static>(
        config: NetworkConfig,
        clock: C,
        seed: u64,
    ) -> Result<Self, OptimaError> {
        Self::build(config, Arc::new(clock), StdRng::seed_from_u64(seed))
    }

    fn build(config: NetworkConfig, clock: Arc<dyn Clock>, rng: StdRng) -> Result<Self, OptimaError> {
        config.validate()?;
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let (node_events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            metrics: NetworkAggregateMetrics::new(config.block_time_ms),
            config,
            clock,
            rng,
            lifecycle: NetworkLifecycle::Uninitialized,
            validators: Vec::new(),
            scheduler: TickScheduler::new(),
            aggregation_timer: None,
            total_stake: 0,
            total_transactions: 0,
            last_tps_sample: 0,
            last_sample_ms: 0,
            started_at_ms: 0,
            events,
            node_events,
        })
    }

    /// Subscribe to the network event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<NetworkEvent> {
        self.events.subscribe()
    }

    /// Subscribe to raw per-node events (started, stopped, block, metrics).
    pub fn subscribe_nodes(&self) -> broadcast::Receiver<NodeEvent> {
        self.node_events.subscribe()
    }

    /// Create the validator pool, start the initial active subset, and arm
    /// the aggregation tick.
    ///
    /// # Errors
    /// Returns `OptimaError::InvalidState` unless the network is
    /// Uninitialized; a network can be initialized at most once.
    pub fn initialize(&mut self) -> Result<(), OptimaError> {
        self.lifecycle.transition(NetworkLifecycle::Initialized)?;

        let now = self.clock.now_ms();
        self.started_at_ms = now;
        self.last_sample_ms = now;

        let mut seen = HashSet::with_capacity(self.config.validator_count);
        for index in 0..self.config.validator_count {
            let id = loop {
                let candidate = ValidatorId::random(&mut self.rng);
                if seen.insert(candidate.clone()) {
                    break candidate;
                }
            };
            let voting_power = self.rng.gen_range(VOTING_POWER_RANGE);
            let commission = self.rng.gen_range(COMMISSION_RANGE);
            let identity = ValidatorIdentity::new(
                id,
                format!("validator-{}", index + 1),
                voting_power,
                commission,
            );
            let node_rng = StdRng::seed_from_u64(self.rng.gen());

            self.total_stake += voting_power;
            self.validators.push(ValidatorNode::new(
                index,
                identity,
                self.config.block_time_ms,
                node_rng,
                now,
            ));
        }

        let mut started = Vec::with_capacity(self.config.active_validators);
        for (index, node) in self
            .validators
            .iter_mut()
            .enumerate()
            .take(self.config.active_validators)
        {
            started.extend(node.start(&mut self.scheduler, now).map(|e| (index, e)));
        }
        for (index, event) in started {
            self.dispatch_node_event(index, event);
        }

        self.aggregation_timer = Some(self.scheduler.schedule(
            TickTarget::Aggregate,
            AGGREGATION_INTERVAL_MS,
            now,
        ));

        self.metrics.total_stake = self.total_stake;
        self.metrics.total_validators = self.validators.len();
        self.metrics.active_validators = self.running_count();

        tracing::info!(
            "Validator network initialized: {} validators, {} active, total stake {}",
            self.validators.len(),
            self.metrics.active_validators,
            self.total_stake
        );
        self.emit(NetworkEvent::Initialized {
            validators: self.validators.len(),
            active_validators: self.metrics.active_validators,
            total_stake: self.total_stake,
        });
        Ok(())
    }

    /// Stop every running validator and the aggregation tick.
    ///
    /// # Errors
    /// Returns `OptimaError::InvalidState` unless the network is Initialized.
    pub fn shutdown(&mut self) -> Result<(), OptimaError> {
        self.lifecycle.transition(NetworkLifecycle::Shutdown)?;

        let mut stopped = Vec::new();
        for (index, node) in self.validators.iter_mut().enumerate() {
            stopped.extend(node.stop(&mut self.scheduler).map(|e| (index, e)));
        }
        for (index, event) in stopped {
            self.dispatch_node_event(index, event);
        }

        if let Some(handle) = self.aggregation_timer.take() {
            self.scheduler.cancel(handle);
        }
        self.metrics.active_validators = 0;

        tracing::info!("Validator network shut down");
        self.emit(NetworkEvent::Shutdown);
        Ok(())
    }

    /// Fire every tick due at the clock's current time, in order.
    ///
    /// Returns the number of ticks fired. Does nothing unless Initialized.
    pub fn advance(&mut self) -> usize {
        if !self.lifecycle.is_initialized() {
            return 0;
        }

        let now = self.clock.now_ms();
        let mut fired = 0;
        while let Some(tick) = self.scheduler.pop_due(now) {
            self.fire(tick);
            fired += 1;
        }
        fired
    }

    fn fire(&mut self, tick: DueTick) {
        let (index, event) = match tick.target {
            TickTarget::Block(index) => (
                index,
                self.validators
                    .get_mut(index)
                    .map(|node| node.simulate_block_production(tick.due_ms)),
            ),
            TickTarget::Metrics(index) => (
                index,
                self.validators
                    .get_mut(index)
                    .map(|node| node.update_system_metrics()),
            ),
            TickTarget::Aggregate => {
                self.aggregate_at(tick.due_ms, true);
                return;
            }
        };

        match event {
            Some(event) => self.dispatch_node_event(index, event),
            None => {
                tracing::warn!("Tick {:?} targets an unknown validator", tick.target);
                self.scheduler.cancel(tick.handle);
            }
        }
    }

    /// `index` is the producing node's position in the pool.
    fn dispatch_node_event(&mut self, index: usize, event: NodeEvent) {
        if self.node_events.receiver_count() > 0 {
            let _ = self.node_events.send(event.clone());
        }

        match event {
            NodeEvent::Block { block, .. } => self.handle_new_block(index, block),
            NodeEvent::Metrics { detail, .. } => self.emit(NetworkEvent::ValidatorMetrics(detail)),
            NodeEvent::Started { .. } | NodeEvent::Stopped { .. } => {}
        }
    }

    /// Fold one validator's block into the network counters and republish it
    /// with the producer's moniker.
    ///
    /// Height is last-received-wins: a block tick that fires later in the
    /// same scheduler pass overwrites an earlier one.
    fn handle_new_block(&mut self, producer: usize, block: BlockEvent) {
        self.metrics.block_height = block.height;
        self.metrics.last_block_time_ms = block.timestamp_ms;
        self.total_transactions += block.transaction_count;
        self.metrics.total_transactions = self.total_transactions;
        self.metrics.consensus_rounds += 1;

        let proposer_moniker = self
            .validators
            .get(producer)
            .map(|node| node.moniker().to_string())
            .unwrap_or_default();

        self.emit(NetworkEvent::Block(NetworkBlock {
            block,
            proposer_moniker,
        }));
    }

    /// Recompute aggregate metrics at the clock's current time and publish
    /// them. Outside the Initialized state this only returns the last sample.
    ///
    /// TPS here is read over the window since the last aggregation tick and
    /// does not move that tick's baseline.
    pub fn update_network_metrics(&mut self) -> NetworkAggregateMetrics {
        if self.lifecycle.is_initialized() {
            let now = self.clock.now_ms();
            self.aggregate_at(now, false);
        } else {
            tracing::debug!(
                "Skipping aggregation: network is {}",
                self.lifecycle
            );
        }
        self.metrics.clone()
    }

    /// Only the periodic tick advances the TPS baseline. An empty window
    /// keeps the previous rate.
    fn aggregate_at(&mut self, now_ms: u64, periodic: bool) {
        let running_ms = now_ms.saturating_sub(self.started_at_ms);

        self.metrics.active_validators = self.running_count();
        self.metrics.total_validators = self.validators.len();

        let window_ms = now_ms.saturating_sub(self.last_sample_ms);
        if window_ms > 0 {
            let delta = self.total_transactions - self.last_tps_sample;
            self.metrics.tps = delta as f64 * 1000.0 / window_ms as f64;
        }
        if periodic {
            self.last_tps_sample = self.total_transactions;
            self.last_sample_ms = now_ms;
        }

        if self.metrics.consensus_rounds > 0 {
            self.metrics.average_block_time_ms =
                running_ms as f64 / self.metrics.consensus_rounds as f64;
        }

        let uptimes: Vec<f64> = self
            .validators
            .iter()
            .filter(|v| v.is_running())
            .map(|v| v.uptime())
            .collect();
        self.metrics.network_uptime = if uptimes.is_empty() {
            NO_RUNNING_UPTIME
        } else {
            uptimes.iter().sum::<f64>() / uptimes.len() as f64
        };

        self.metrics.total_stake = self.total_stake;
        self.metrics.total_transactions = self.total_transactions;
        self.metrics.running_time_secs = running_ms / 1000;

        self.emit(NetworkEvent::Metrics(self.metrics.clone()));
    }

    /// Latest aggregate sample with stake, transaction total and running time
    /// refreshed as of now.
    pub fn get_network_metrics(&self) -> NetworkAggregateMetrics {
        let mut snapshot = self.metrics.clone();
        snapshot.total_stake = self.total_stake;
        snapshot.total_transactions = self.total_transactions;
        snapshot.running_time_secs = match self.lifecycle {
            NetworkLifecycle::Uninitialized => 0,
            _ => self.clock.now_ms().saturating_sub(self.started_at_ms) / 1000,
        };
        snapshot
    }

    /// Summary of every validator, or only running ones.
    pub fn get_validators(&self, active_only: bool) -> Vec<ValidatorInfo> {
        self.validators
            .iter()
            .filter(|v| !active_only || v.is_running())
            .map(ValidatorNode::get_info)
            .collect()
    }

    /// Full snapshot of one validator, or `None` if the id is unknown.
    pub fn get_validator(&self, id: &str) -> Option<ValidatorDetail> {
        self.position(id)
            .map(|index| self.validators[index].get_metrics())
    }

    /// Start a stopped validator.
    ///
    /// Returns `false` if the id is unknown, the validator already runs, or
    /// the network is not Initialized.
    pub fn start_validator(&mut self, id: &str) -> bool {
        if !self.lifecycle.is_initialized() {
            tracing::debug!("start_validator({}) ignored: network is {}", id, self.lifecycle);
            return false;
        }
        let now = self.clock.now_ms();
        let Some(index) = self.position(id) else {
            tracing::debug!("start_validator({}) ignored: unknown validator", id);
            return false;
        };
        let node = &mut self.validators[index];
        match node.start(&mut self.scheduler, now) {
            Some(event) => {
                self.metrics.active_validators = self.running_count();
                self.dispatch_node_event(index, event);
                true
            }
            None => false,
        }
    }

    /// Stop a running validator.
    ///
    /// Returns `false` if the id is unknown, the validator is already
    /// stopped, or the network is not Initialized.
    pub fn stop_validator(&mut self, id: &str) -> bool {
        if !self.lifecycle.is_initialized() {
            tracing::debug!("stop_validator({}) ignored: network is {}", id, self.lifecycle);
            return false;
        }
        let Some(index) = self.position(id) else {
            tracing::debug!("stop_validator({}) ignored: unknown validator", id);
            return false;
        };
        let node = &mut self.validators[index];
        match node.stop(&mut self.scheduler) {
            Some(event) => {
                self.metrics.active_validators = self.running_count();
                self.dispatch_node_event(index, event);
                true
            }
            None => false,
        }
    }

    pub fn lifecycle(&self) -> NetworkLifecycle {
        self.lifecycle
    }

    pub fn total_stake(&self) -> u64 {
        self.total_stake
    }

    /// Number of armed timers: two per running validator plus the
    /// aggregation tick while Initialized.
    pub fn scheduled_timers(&self) -> usize {
        self.scheduler.len()
    }

    fn running_count(&self) -> usize {
        self.validators.iter().filter(|v| v.is_running()).count()
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.validators.iter().position(|v| v.id().as_str() == id)
    }

    fn emit(&self, event: NetworkEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }
}
