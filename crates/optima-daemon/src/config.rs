// crates/optima-daemon/src/config.rs
//
// Runtime configuration for the OptimaChain simulator daemon.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use optima_core::NetworkConfig;

/// Runtime configuration for the daemon.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    /// Size of the validator pool.
    #[serde(default = "default_validator_count")]
    pub validator_count: usize,

    /// Validators started at initialization.
    #[serde(default = "default_active_validators")]
    pub active_validators: usize,

    /// Block tick interval in milliseconds.
    #[serde(default = "default_block_time_ms")]
    pub block_time_ms: u64,

    /// RNG seed. When unset, `run` draws from OS entropy and `replay` uses 0.
    #[serde(default)]
    pub seed: Option<u64>,

    /// How often the driver polls the scheduler, in milliseconds.
    #[serde(default = "default_tick_resolution_ms")]
    pub tick_resolution_ms: u64,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_validator_count() -> usize {
    NetworkConfig::default().validator_count
}

fn default_active_validators() -> usize {
    NetworkConfig::default().active_validators
}

fn default_block_time_ms() -> u64 {
    NetworkConfig::default().block_time_ms
}

fn default_tick_resolution_ms() -> u64 {
    100
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            validator_count: default_validator_count(),
            active_validators: default_active_validators(),
            block_time_ms: default_block_time_ms(),
            seed: None,
            tick_resolution_ms: default_tick_resolution_ms(),
            log_level: default_log_level(),
        }
    }
}

impl DaemonConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: DaemonConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// The subset of settings the validator network is built from.
    pub fn network_config(&self) -> NetworkConfig {
        NetworkConfig::new(
            self.validator_count,
            self.active_validators,
            self.block_time_ms,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = DaemonConfig::parse("").unwrap();
        assert_eq!(config.validator_count, 100);
        assert_eq!(config.active_validators, 50);
        assert_eq!(config.block_time_ms, 2000);
        assert_eq!(config.tick_resolution_ms, 100);
        assert_eq!(config.seed, None);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_partial_override() {
        let config = DaemonConfig::parse(
            r#"
            validator_count = 10
            active_validators = 3
            block_time_ms = 100
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(config.network_config(), NetworkConfig::new(10, 3, 100));
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_rejects_malformed_toml() {
        assert!(DaemonConfig::parse("validator_count = \"many\"").is_err());
    }
}
