//! Run reports.
//!
//! Generates both a JSON document and the human-readable summary printed at
//! the end of a run.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::Utc;
use color_eyre::eyre::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::topology::NodeId;
use crate::traffic::DeliveryStats;

/// Counters and final state of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub seed: u64,
    pub horizon_secs: f64,
    pub attackers: Vec<NodeId>,
    pub total_packets_sent: u64,
    pub total_packets_received: u64,
    pub delivery: DeliveryStats,
    pub telemetry_samples: usize,
    pub events_processed: u64,
    /// Remaining energy per node when the clock stopped
    pub final_energy: BTreeMap<NodeId, f64>,
}

impl RunReport {
    /// Fraction of sent packets that reached the sink, 0 when nothing was sent
    pub fn delivery_ratio(&self) -> f64 {
        if self.total_packets_sent == 0 {
            0.0
        } else {
            self.total_packets_received as f64 / self.total_packets_sent as f64
        }
    }

    /// Node with the least energy left
    pub fn most_drained_node(&self) -> Option<(NodeId, f64)> {
        self.final_energy
            .iter()
            .min_by(|a, b| a.1.total_cmp(b.1))
            .map(|(&node, &joules)| (node, joules))
    }
}

/// Attacked run next to the same scenario without attackers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaselineComparison {
    pub attacked: RunReport,
    pub baseline: RunReport,
}

impl BaselineComparison {
    /// Packets the baseline delivered that the attacked run did not
    pub fn delivery_deficit(&self) -> i64 {
        self.baseline.total_packets_received as i64 - self.attacked.total_packets_received as i64
    }
}

#[derive(Serialize)]
struct ReportDocument<'a, T: Serialize> {
    generated_at: String,
    #[serde(flatten)]
    report: &'a T,
}

/// Write any report as pretty JSON, stamped with the generation time
pub fn write_json_report<T: Serialize>(report: &T, output_path: &Path) -> Result<()> {
    let document = ReportDocument {
        generated_at: Utc::now().to_rfc3339(),
        report,
    };
    let json = serde_json::to_string_pretty(&document).context("Failed to serialize report to JSON")?;

    fs::write(output_path, json)
        .with_context(|| format!("Failed to write JSON report to {}", output_path.display()))?;

    log::info!("JSON report written to {}", output_path.display());
    Ok(())
}

/// Human-readable summary of one run
pub fn format_summary(report: &RunReport) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push(format!("Total Packets Sent: {}", report.total_packets_sent));
    lines.push(format!("Total Packets Received: {}", report.total_packets_received));
    lines.push(format!("Delivery Ratio: {:.1}%", report.delivery_ratio() * 100.0));

    if report.attackers.is_empty() {
        lines.push("Attackers: none".to_string());
    } else {
        let ids: Vec<String> = report.attackers.iter().map(|id| id.to_string()).collect();
        lines.push(format!("Attackers: {}", ids.join(", ")));
    }

    lines.push("Losses:".to_string());
    lines.push(format!("  Sunk by attacker: {}", report.delivery.sunk_by_attacker));
    lines.push(format!("  Lost in transit:  {}", report.delivery.lost_in_transit));
    lines.push(format!("  No route:         {}", report.delivery.no_route));
    lines.push(format!("  Rejected by sink: {}", report.delivery.rejected_by_sink));

    if let Some((node, joules)) = report.most_drained_node() {
        lines.push(format!("Most drained node: {} ({:.3} J left)", node, joules));
    }

    lines.join("\n")
}

/// Summary of an attacked run against its baseline
pub fn format_comparison(comparison: &BaselineComparison) -> String {
    let mut lines: Vec<String> = Vec::new();

    lines.push("=== Attacked run ===".to_string());
    lines.push(format_summary(&comparison.attacked));
    lines.push(String::new());
    lines.push("=== Baseline (no attackers) ===".to_string());
    lines.push(format_summary(&comparison.baseline));
    lines.push(String::new());
    lines.push(format!(
        "Packets lost to the attack: {}",
        comparison.delivery_deficit()
    ));

    lines.join("\n")
}
