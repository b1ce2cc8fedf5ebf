//! Result export: per-run rows to CSV, whole batches to JSON, and a run's
//! admission log to CSV.

use std::path::Path;

use mci_core::telemetry::SolutionRecord;

use crate::metrics::{ReplicationReport, ReplicationSummary};
use crate::objective::ObjectiveWeights;

#[path = "export/csv.rs"]
mod csv;
#[path = "export/json.rs"]
mod json;

/// One row per successful run, with its objective under `weights`.
pub fn export_runs_to_csv<P: AsRef<Path>>(
    report: &ReplicationReport,
    weights: &ObjectiveWeights,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    csv::export_runs_impl(report, weights, file)
}

/// The admission log of one run: sequence, victim, team, department, minute.
pub fn export_solution_to_csv<P: AsRef<Path>>(
    records: &[SolutionRecord],
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    csv::export_solution_impl(records, file)
}

/// The summary, every run and every failure as one pretty-printed document.
pub fn export_to_json<P: AsRef<Path>>(
    report: &ReplicationReport,
    summary: &ReplicationSummary,
    path: P,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = std::fs::File::create(path)?;
    json::export_to_json_impl(report, summary, file)
}
