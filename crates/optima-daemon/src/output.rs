// crates/optima-daemon/src/output.rs
//
// Output formatting for the replay subcommand.
// Supports table and JSON output modes.

use serde::Serialize;
use tabled::{Table, Tabled};

use optima_core::{NetworkAggregateMetrics, ValidatorInfo, ValidatorStatus};

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// One validator as a table row.
#[derive(Debug, Tabled)]
pub struct ValidatorRow {
    #[tabled(rename = "Moniker")]
    pub moniker: String,
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Status")]
    pub status: &'static str,
    #[tabled(rename = "Power")]
    pub voting_power: u64,
    #[tabled(rename = "Commission")]
    pub commission: String,
    #[tabled(rename = "Uptime")]
    pub uptime: String,
    #[tabled(rename = "Proposed")]
    pub blocks_proposed: u64,
    #[tabled(rename = "Validated")]
    pub blocks_validated: u64,
    #[tabled(rename = "Txs")]
    pub transactions: u64,
    #[tabled(rename = "Peers")]
    pub peers: u32,
}

impl From<&ValidatorInfo> for ValidatorRow {
    fn from(v: &ValidatorInfo) -> Self {
        Self {
            moniker: v.moniker.clone(),
            id: v.id.short().to_string(),
            status: match v.status {
                ValidatorStatus::Active => "active",
                ValidatorStatus::Inactive => "inactive",
            },
            voting_power: v.voting_power,
            commission: format!("{:.0}%", v.commission_rate * 100.0),
            uptime: format!("{:.3}%", v.uptime),
            blocks_proposed: v.blocks_proposed,
            blocks_validated: v.blocks_validated,
            transactions: v.transactions,
            peers: v.peers,
        }
    }
}

/// Everything the replay command prints in JSON mode.
#[derive(Debug, Serialize)]
pub struct ReplayReport<'a> {
    pub seed: u64,
    pub simulated_secs: u64,
    pub metrics: &'a NetworkAggregateMetrics,
    pub validators: &'a [ValidatorInfo],
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Human-readable summary block for aggregate metrics.
pub fn format_summary(metrics: &NetworkAggregateMetrics) -> String {
    format!(
        "Block height:       {}\n\
         Consensus rounds:   {}\n\
         TPS (last sample):  {:.0}\n\
         Avg block time:     {:.0} ms\n\
         Active validators:  {}/{}\n\
         Network uptime:     {:.3}%\n\
         Total stake:        {}\n\
         Total transactions: {}\n\
         Running time:       {} s",
        metrics.block_height,
        metrics.consensus_rounds,
        metrics.tps,
        metrics.average_block_time_ms,
        metrics.active_validators,
        metrics.total_validators,
        metrics.network_uptime,
        metrics.total_stake,
        metrics.total_transactions,
        metrics.running_time_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use optima_core::ValidatorId;

    fn info() -> ValidatorInfo {
        ValidatorInfo {
            id: ValidatorId::from("0123456789abcdef0123456789abcdef01234567"),
            moniker: "validator-1".to_string(),
            voting_power: 4200,
            commission_rate: 0.05,
            uptime: 99.5,
            status: ValidatorStatus::Active,
            peers: 12,
            blocks_proposed: 1,
            blocks_validated: 10,
            transactions: 500,
        }
    }

    #[test]
    fn test_row_shortens_id() {
        let row = ValidatorRow::from(&info());
        assert_eq!(row.id, "01234567");
        assert_eq!(row.status, "active");
        assert_eq!(row.commission, "5%");
        let table = format_table(&[row]);
        assert!(table.contains("validator-1"));
        assert!(table.contains("Validated"));
    }

    #[test]
    fn test_report_json() {
        let metrics = NetworkAggregateMetrics::new(2000);
        let validators = vec![info()];
        let json = format_json(&ReplayReport {
            seed: 3,
            simulated_secs: 60,
            metrics: &metrics,
            validators: &validators,
        });
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["seed"], 3);
        assert_eq!(value["validators"][0]["status"], "active");
        assert_eq!(value["metrics"]["average_block_time_ms"], 2000.0);
    }
}
