// crates/optima-daemon/src/main.rs
//
// Binary entrypoint for the OptimaChain validator-network simulator.
//
// Loads configuration, initializes tracing, constructs the network with an
// explicit handle, and either drives it against the wall clock (`run`) or
// replays it instantly on a virtual clock (`replay`).

mod config;
mod driver;
mod output;

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tokio::sync::RwLock;

use config::DaemonConfig;
use driver::SharedNetwork;
use optima_core::{Clock, ManualClock, SystemClock};
use optima_sim::ValidatorNetwork;
use output::{OutputFormat, ReplayReport, ValidatorRow};

/// OptimaChain validator-network simulator.
#[derive(Parser, Debug)]
#[command(
    name = "optima-daemon",
    version = "0.1.0",
    about = "Simulates an OptimaChain validator network and its telemetry"
)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.optima/config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the simulation in real time until Ctrl-C.
    Run {
        /// Stop after this many seconds instead of waiting for Ctrl-C.
        #[arg(long)]
        duration_secs: Option<u64>,
    },

    /// Simulate a span of time instantly and print the resulting state.
    Replay {
        /// Simulated seconds to advance.
        #[arg(long, default_value_t = 60)]
        seconds: u64,

        /// RNG seed (overrides the config file).
        #[arg(long)]
        seed: Option<u64>,

        /// Output format.
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// List only running validators.
        #[arg(long)]
        active_only: bool,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config_path = expand_tilde(&args.config);
    let loaded = DaemonConfig::load(&config_path);
    let daemon_config = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => DaemonConfig::default(),
    };

    // Initialize tracing subscriber for structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&daemon_config.log_level)),
        )
        .init();

    match loaded {
        Ok(_) => tracing::info!("Loaded configuration from {}", config_path),
        Err(e) => tracing::warn!(
            "Could not load config from {}: {}. Using defaults.",
            config_path,
            e
        ),
    }

    match args.command {
        Command::Run { duration_secs } => run(&daemon_config, duration_secs).await?,
        Command::Replay {
            seconds,
            seed,
            format,
            active_only,
        } => replay(&daemon_config, seconds, seed, format, active_only)?,
    }

    Ok(())
}

/// Drive the network on the wall clock.
async fn run(
    config: &DaemonConfig,
    duration_secs: Option<u64>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("OptimaChain validator simulator v0.1.0");
    tracing::info!(
        "Validators: {} ({} active), block time {}ms",
        config.validator_count,
        config.active_validators,
        config.block_time_ms
    );

    let mut network = match config.seed {
        Some(seed) => ValidatorNetwork::with_seed(config.network_config(), SystemClock, seed)?,
        None => ValidatorNetwork::new(config.network_config(), SystemClock)?,
    };

    let logger = tokio::spawn(driver::log_events(network.subscribe()));
    network.initialize()?;

    let shared: SharedNetwork = Arc::new(RwLock::new(network));
    driver::run_network(
        shared,
        Duration::from_millis(config.tick_resolution_ms.max(1)),
        duration_secs.map(Duration::from_secs),
    )
    .await?;

    if let Err(e) = logger.await {
        tracing::error!("Event logger task failed: {}", e);
    }
    tracing::info!("Simulator shut down gracefully");
    Ok(())
}

/// Advance a seeded network on a virtual clock and print the result.
fn replay(
    config: &DaemonConfig,
    seconds: u64,
    seed: Option<u64>,
    format: OutputFormat,
    active_only: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let seed = seed.or(config.seed).unwrap_or(0);
    let clock = ManualClock::new(SystemClock.now_ms());
    let mut network = ValidatorNetwork::with_seed(config.network_config(), clock.clone(), seed)?;
    network.initialize()?;

    for _ in 0..seconds {
        clock.advance(1000);
        network.advance();
    }

    let metrics = network.get_network_metrics();
    let validators = network.get_validators(active_only);

    match format {
        OutputFormat::Table => {
            println!("{}", output::format_summary(&metrics));
            println!();
            let rows: Vec<ValidatorRow> = validators.iter().map(ValidatorRow::from).collect();
            println!("{}", output::format_table(&rows));
        }
        OutputFormat::Json => {
            println!(
                "{}",
                output::format_json(&ReplayReport {
                    seed,
                    simulated_secs: seconds,
                    metrics: &metrics,
                    validators: &validators,
                })
            );
        }
    }

    network.shutdown()?;
    Ok(())
}

/// Expand `~` at the start of a path to the user's home directory.
fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return format!("{}/{}", home.display(), rest);
        }
    }
    path.to_string()
}
