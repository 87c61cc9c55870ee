// crates/optima-sim/tests/network_scenarios.rs
//
// Integration tests for the validator-network simulator.
//
// Every test drives the network with a ManualClock, so "after 1000ms" means
// "advance the virtual clock by 1000ms and fire everything that came due".

use std::collections::HashSet;

use tokio::sync::broadcast::error::TryRecvError;

use optima_core::{ManualClock, NetworkConfig, NetworkEvent, NodeEvent, ValidatorStatus};
use optima_sim::{NetworkLifecycle, ValidatorNetwork, NO_RUNNING_UPTIME};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// 2023-11-14T22:13:20Z; a block-time-aligned starting instant.
const T0: u64 = 1_700_000_000_000;

fn seeded_network(
    validator_count: usize,
    active: usize,
    block_time_ms: u64,
    seed: u64,
) -> (ValidatorNetwork, ManualClock) {
    let clock = ManualClock::new(T0);
    let network = ValidatorNetwork::with_seed(
        NetworkConfig::new(validator_count, active, block_time_ms),
        clock.clone(),
        seed,
    )
    .expect("valid config");
    (network, clock)
}

/// Advance the clock in `step_ms` increments, firing ticks after each step.
fn run_for(network: &mut ValidatorNetwork, clock: &ManualClock, total_ms: u64, step_ms: u64) {
    let mut elapsed = 0;
    while elapsed < total_ms {
        clock.advance(step_ms);
        network.advance();
        elapsed += step_ms;
    }
}

fn drain<T: Clone>(rx: &mut tokio::sync::broadcast::Receiver<T>) -> Vec<T> {
    let mut out = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => out.push(event),
            Err(TryRecvError::Lagged(_)) => continue,
            Err(_) => break,
        }
    }
    out
}

fn running_count(network: &ValidatorNetwork) -> usize {
    network
        .get_validators(false)
        .iter()
        .filter(|v| v.status == ValidatorStatus::Active)
        .count()
}

// ===========================================================================
// Stake
// ===========================================================================

/// Total stake equals the sum of voting power and never changes.
#[test]
fn test_total_stake_is_sum_of_voting_power_and_invariant() {
    let (mut network, clock) = seeded_network(25, 10, 200, 1);
    network.initialize().unwrap();

    let sum: u64 = network
        .get_validators(false)
        .iter()
        .map(|v| v.voting_power)
        .sum();
    assert_eq!(network.total_stake(), sum);
    assert_eq!(network.get_network_metrics().total_stake, sum);

    run_for(&mut network, &clock, 5_000, 250);
    let some_id = network.get_validators(true)[0].id.to_string();
    network.stop_validator(&some_id);
    run_for(&mut network, &clock, 2_000, 500);

    assert_eq!(network.total_stake(), sum);
    assert_eq!(network.get_network_metrics().total_stake, sum);
}

// ===========================================================================
// Active set
// ===========================================================================

/// `get_validators(true)` tracks running nodes through start/stop calls.
#[test]
fn test_active_listing_matches_running_nodes() {
    let (mut network, clock) = seeded_network(10, 4, 100, 2);
    network.initialize().unwrap();
    assert_eq!(network.get_validators(true).len(), 4);

    let inactive_id = network
        .get_validators(false)
        .into_iter()
        .find(|v| v.status == ValidatorStatus::Inactive)
        .unwrap()
        .id;
    assert!(network.start_validator(inactive_id.as_str()));

    let active = network.get_validators(true);
    assert_eq!(active.len(), 5);
    assert!(active.iter().any(|v| v.id == inactive_id));
    assert_eq!(active.len(), running_count(&network));
    assert_eq!(network.get_network_metrics().active_validators, 5);

    run_for(&mut network, &clock, 1_000, 100);
    assert_eq!(network.get_network_metrics().active_validators, 5);
}

/// Start/stop return values follow the no-op rules.
#[test]
fn test_start_stop_return_values() {
    let (mut network, _clock) = seeded_network(6, 2, 100, 3);
    network.initialize().unwrap();

    assert!(!network.start_validator("unknown-id"));
    assert!(!network.stop_validator("unknown-id"));

    let validators = network.get_validators(false);
    let running = validators[0].id.to_string();
    let stopped = validators[5].id.to_string();

    assert!(!network.stop_validator(&stopped));
    assert!(!network.start_validator(&running));

    assert!(network.stop_validator(&running));
    assert!(!network
        .get_validators(true)
        .iter()
        .any(|v| v.id.as_str() == running));
    assert!(!network.stop_validator(&running));
}

/// Start/stop before initialize or after shutdown are no-ops.
#[test]
fn test_start_stop_outside_initialized_state() {
    let (mut network, _clock) = seeded_network(3, 1, 100, 4);
    assert!(!network.start_validator("anything"));

    network.initialize().unwrap();
    let id = network.get_validators(false)[1].id.to_string();
    network.shutdown().unwrap();

    assert!(!network.start_validator(&id));
    assert_eq!(network.get_validators(true).len(), 0);
}

// ===========================================================================
// Timers
// ===========================================================================

/// Repeated start/stop cycles never leak or double-cancel timers.
#[test]
fn test_start_stop_cycles_do_not_leak_timers() {
    let (mut network, clock) = seeded_network(3, 0, 100, 5);
    network.initialize().unwrap();
    assert_eq!(network.scheduled_timers(), 1);

    let id = network.get_validators(false)[0].id.to_string();
    for _ in 0..20 {
        assert!(network.start_validator(&id));
        assert!(!network.start_validator(&id));
        assert_eq!(network.scheduled_timers(), 3);
        assert!(network.stop_validator(&id));
        assert_eq!(network.scheduled_timers(), 1);
    }

    let before = network.get_validator(&id).unwrap().metrics.blocks_validated;
    run_for(&mut network, &clock, 2_000, 100);
    let after = network.get_validator(&id).unwrap().metrics.blocks_validated;
    assert_eq!(before, after, "a stopped validator must not tick");
}

// ===========================================================================
// Uptime
// ===========================================================================

/// Uptime never rises and never drops below 99 while running.
#[test]
fn test_uptime_non_increasing_with_floor() {
    let (mut network, clock) = seeded_network(5, 5, 10, 6);
    network.initialize().unwrap();
    let ids: Vec<String> = network
        .get_validators(false)
        .iter()
        .map(|v| v.id.to_string())
        .collect();

    let mut previous: Vec<f64> = ids
        .iter()
        .map(|id| network.get_validator(id).unwrap().uptime)
        .collect();
    for _ in 0..200 {
        clock.advance(1_000);
        network.advance();
        for (id, prev) in ids.iter().zip(previous.iter_mut()) {
            let uptime = network.get_validator(id).unwrap().uptime;
            assert!(uptime <= *prev);
            assert!(uptime >= 99.0);
            *prev = uptime;
        }
    }
}

/// With nothing running, network uptime is the finite sentinel.
#[test]
fn test_network_uptime_sentinel_when_nothing_runs() {
    let (mut network, clock) = seeded_network(4, 4, 100, 7);
    network.initialize().unwrap();
    run_for(&mut network, &clock, 1_000, 100);
    assert!(network.get_network_metrics().network_uptime >= 99.0);

    for v in network.get_validators(true) {
        assert!(network.stop_validator(v.id.as_str()));
    }
    let metrics = network.update_network_metrics();
    assert!(metrics.network_uptime.is_finite());
    assert_eq!(metrics.network_uptime, NO_RUNNING_UPTIME);
    assert_eq!(metrics.active_validators, 0);
    assert!(metrics.average_block_time_ms.is_finite());
}

/// Network uptime averages running validators only; stopped ones stay at
/// 100 and must not pull the mean up.
#[test]
fn test_network_uptime_is_mean_over_running_validators() {
    let (mut network, clock) = seeded_network(4, 2, 10, 21);
    network.initialize().unwrap();

    let mut decayed = false;
    for _ in 0..60 {
        run_for(&mut network, &clock, 1_000, 1_000);
        if network.get_validators(true).iter().any(|v| v.uptime < 100.0) {
            decayed = true;
            break;
        }
    }
    assert!(decayed, "a running validator should lose uptime within 60s");

    let metrics = network.update_network_metrics();
    let running = network.get_validators(true);
    let all = network.get_validators(false);
    assert_eq!(running.len(), 2);
    assert!(all
        .iter()
        .filter(|v| v.status != ValidatorStatus::Active)
        .all(|v| v.uptime == 100.0));

    let running_mean = running.iter().map(|v| v.uptime).sum::<f64>() / running.len() as f64;
    let all_mean = all.iter().map(|v| v.uptime).sum::<f64>() / all.len() as f64;
    assert!((metrics.network_uptime - running_mean).abs() < 1e-9);
    assert!((metrics.network_uptime - all_mean).abs() > 1e-9);
}

// ===========================================================================
// Scenario
// ===========================================================================

/// 10 validators, 3 active, 100ms blocks: after 1000ms each active node has
/// validated exactly 10 blocks.
#[test]
fn test_scenario_ten_validators_three_active() {
    let (mut network, clock) = seeded_network(10, 3, 100, 8);
    network.initialize().unwrap();

    clock.advance(1_000);
    network.advance();

    let metrics = network.update_network_metrics();
    assert_eq!(metrics.active_validators, 3);
    assert_eq!(metrics.total_validators, 10);
    assert_eq!(metrics.consensus_rounds, 30);
    assert_eq!(metrics.running_time_secs, 1);

    for v in network.get_validators(false) {
        match v.status {
            ValidatorStatus::Active => assert_eq!(v.blocks_validated, 10),
            ValidatorStatus::Inactive => assert_eq!(v.blocks_validated, 0),
        }
    }

    let node_tx: u64 = network
        .get_validators(false)
        .iter()
        .map(|v| v.transactions)
        .sum();
    assert_eq!(metrics.total_transactions, node_tx);
    assert_eq!(metrics.block_height, (T0 + 1_000) / 100);
}

/// Fine-grained stepping and one big jump produce the same counters.
#[test]
fn test_clock_jump_replays_every_tick() {
    let (mut stepped, stepped_clock) = seeded_network(6, 3, 150, 9);
    let (mut jumped, jumped_clock) = seeded_network(6, 3, 150, 9);
    stepped.initialize().unwrap();
    jumped.initialize().unwrap();

    run_for(&mut stepped, &stepped_clock, 6_000, 50);
    jumped_clock.advance(6_000);
    jumped.advance();

    assert_eq!(stepped.get_validators(false), jumped.get_validators(false));
    assert_eq!(stepped.get_network_metrics(), jumped.get_network_metrics());
}

/// Same seed and clock readings give identical networks.
#[test]
fn test_seeded_runs_are_deterministic() {
    let (mut a, clock_a) = seeded_network(8, 5, 100, 42);
    let (mut b, clock_b) = seeded_network(8, 5, 100, 42);
    a.initialize().unwrap();
    b.initialize().unwrap();
    run_for(&mut a, &clock_a, 3_000, 100);
    run_for(&mut b, &clock_b, 3_000, 100);

    let ids_a: HashSet<_> = a.get_validators(false).into_iter().map(|v| v.id).collect();
    let ids_b: HashSet<_> = b.get_validators(false).into_iter().map(|v| v.id).collect();
    assert_eq!(ids_a, ids_b);
    assert_eq!(a.get_network_metrics(), b.get_network_metrics());
}

// ===========================================================================
// Snapshots
// ===========================================================================

/// Back-to-back info and detail snapshots agree.
#[test]
fn test_info_and_detail_snapshots_agree() {
    let (mut network, clock) = seeded_network(3, 3, 100, 10);
    network.initialize().unwrap();
    run_for(&mut network, &clock, 2_500, 100);

    for info in network.get_validators(false) {
        let detail = network.get_validator(info.id.as_str()).unwrap();
        assert_eq!(info.blocks_validated, detail.metrics.blocks_validated);
        assert_eq!(info.transactions, detail.metrics.transactions);
        assert_eq!(info.uptime, detail.uptime);
    }
}

#[test]
fn test_get_validator_unknown_id() {
    let (mut network, _clock) = seeded_network(2, 1, 100, 11);
    network.initialize().unwrap();
    assert!(network.get_validator("nope").is_none());
}

// ===========================================================================
// Lifecycle and events
// ===========================================================================

/// Shutdown stops everything, is terminal, and no tick fires afterward.
#[test]
fn test_shutdown_is_terminal() {
    let (mut network, clock) = seeded_network(5, 5, 100, 12);
    network.initialize().unwrap();
    run_for(&mut network, &clock, 500, 100);

    let mut rx = network.subscribe();
    network.shutdown().unwrap();
    assert_eq!(network.lifecycle(), NetworkLifecycle::Shutdown);
    assert_eq!(network.scheduled_timers(), 0);
    assert_eq!(network.get_validators(true).len(), 0);

    let events = drain(&mut rx);
    assert!(matches!(events.last(), Some(NetworkEvent::Shutdown)));

    let rounds = network.get_network_metrics().consensus_rounds;
    clock.advance(10_000);
    assert_eq!(network.advance(), 0);
    assert_eq!(network.get_network_metrics().consensus_rounds, rounds);
    assert!(drain(&mut rx).is_empty());

    assert!(network.shutdown().is_err());
    assert!(network.initialize().is_err());
}

/// The network stream carries initialized, enriched blocks, aggregate and
/// per-validator metrics.
#[test]
fn test_network_event_stream() {
    let (mut network, clock) = seeded_network(4, 2, 250, 13);
    let mut rx = network.subscribe();
    network.initialize().unwrap();

    let events = drain(&mut rx);
    match events.as_slice() {
        [NetworkEvent::Initialized {
            validators,
            active_validators,
            total_stake,
        }] => {
            assert_eq!(*validators, 4);
            assert_eq!(*active_validators, 2);
            assert_eq!(*total_stake, network.total_stake());
        }
        other => panic!("unexpected events: {:?}", other),
    }

    clock.advance(1_000);
    network.advance();
    let events = drain(&mut rx);

    let monikers: HashSet<String> = network
        .get_validators(true)
        .into_iter()
        .map(|v| v.moniker)
        .collect();
    let blocks: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            NetworkEvent::Block(b) => Some(b),
            _ => None,
        })
        .collect();
    assert_eq!(blocks.len(), 2 * 4);
    assert!(blocks.iter().all(|b| monikers.contains(&b.proposer_moniker)));

    let validator_metrics = events
        .iter()
        .filter(|e| matches!(e, NetworkEvent::ValidatorMetrics(_)))
        .count();
    assert_eq!(validator_metrics, 2);

    let aggregates = events
        .iter()
        .filter(|e| matches!(e, NetworkEvent::Metrics(_)))
        .count();
    assert_eq!(aggregates, 1);
}

/// Raw node events include start/stop notifications.
#[test]
fn test_node_event_stream() {
    let (mut network, _clock) = seeded_network(3, 1, 100, 14);
    let mut rx = network.subscribe_nodes();
    network.initialize().unwrap();

    let started = drain(&mut rx);
    assert_eq!(started.len(), 1);
    assert!(matches!(started[0], NodeEvent::Started { .. }));

    let id = network.get_validators(false)[2].id.to_string();
    network.start_validator(&id);
    network.stop_validator(&id);
    let events = drain(&mut rx);
    assert_eq!(events.len(), 2);
    assert!(matches!(&events[0], NodeEvent::Started { moniker, .. } if moniker == "validator-3"));
    assert!(matches!(&events[1], NodeEvent::Stopped { id: stopped, .. } if stopped.as_str() == id));
}
