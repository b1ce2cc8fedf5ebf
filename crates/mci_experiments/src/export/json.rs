use serde::Serialize;

use crate::metrics::{ReplicationReport, ReplicationSummary, RunFailure, RunResult};

#[derive(Serialize)]
struct JsonReport<'a> {
    summary: &'a ReplicationSummary,
    runs: &'a [RunResult],
    failures: &'a [RunFailure],
}

pub(crate) fn export_to_json_impl(
    report: &ReplicationReport,
    summary: &ReplicationSummary,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = JsonReport {
        summary,
        runs: &report.runs,
        failures: &report.failures,
    };
    serde_json::to_writer_pretty(file, &document)?;
    Ok(())
}
