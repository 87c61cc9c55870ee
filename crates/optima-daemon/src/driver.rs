// crates/optima-daemon/src/driver.rs
//
// Wall-clock driver for a validator network.
//
// The network itself is synchronous; this module polls it from a tokio
// interval and logs its event stream. The network handle is passed in
// explicitly and shared behind an RwLock.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, RwLock};
use tokio::time::{Instant, MissedTickBehavior};

use optima_core::{NetworkEvent, OptimaError};
use optima_sim::ValidatorNetwork;

/// Shared handle to the simulated network.
pub type SharedNetwork = Arc<RwLock<ValidatorNetwork>>;

/// Poll the network every `resolution` until Ctrl-C or `duration` elapses,
/// then shut it down.
pub async fn run_network(
    network: SharedNetwork,
    resolution: Duration,
    duration: Option<Duration>,
) -> Result<(), OptimaError> {
    let mut interval = tokio::time::interval(resolution);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let deadline = duration.map(|d| Instant::now() + d);

    tracing::info!(
        "Simulation driver started (resolution={}ms)",
        resolution.as_millis()
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Simulation driver received shutdown signal");
                break;
            }
            _ = wait_for(deadline) => {
                tracing::info!("Simulation duration elapsed");
                break;
            }
            _ = interval.tick() => {
                let fired = network.write().await.advance();
                tracing::trace!("Fired {} ticks", fired);
            }
        }
    }

    network.write().await.shutdown()
}

async fn wait_for(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Log every network event until the network shuts down or the channel
/// closes. Returns the number of events logged.
pub async fn log_events(mut rx: broadcast::Receiver<NetworkEvent>) -> usize {
    let mut seen = 0;
    loop {
        match rx.recv().await {
            Ok(event) => {
                seen += 1;
                tracing::trace!("Network event: {}", event.kind());
                match event {
                    NetworkEvent::Initialized {
                        validators,
                        active_validators,
                        total_stake,
                    } => tracing::info!(
                        "Network up: {} validators ({} active), total stake {}",
                        validators,
                        active_validators,
                        total_stake
                    ),
                    NetworkEvent::Block(b) => tracing::debug!(
                        "Block {} from {} ({} txs, hash {})",
                        b.block.height,
                        b.proposer_moniker,
                        b.block.transaction_count,
                        &b.block.hash[..12]
                    ),
                    NetworkEvent::Metrics(m) => tracing::info!(
                        "height={} tps={:.0} active={}/{} uptime={:.3}% avg_block={:.0}ms rounds={}",
                        m.block_height,
                        m.tps,
                        m.active_validators,
                        m.total_validators,
                        m.network_uptime,
                        m.average_block_time_ms,
                        m.consensus_rounds
                    ),
                    NetworkEvent::ValidatorMetrics(v) => tracing::trace!(
                        "{}: cpu={:.1}% mem={:.1}% peers={}",
                        v.moniker,
                        v.metrics.cpu_usage,
                        v.metrics.memory_usage,
                        v.metrics.peers
                    ),
                    NetworkEvent::Shutdown => {
                        tracing::info!("Network shut down");
                        break;
                    }
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event logger lagged, skipped {} events", skipped);
            }
            Err(RecvError::Closed) => break,
        }
    }
    seen
}
