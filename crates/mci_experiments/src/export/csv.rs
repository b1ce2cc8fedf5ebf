use mci_core::telemetry::SolutionRecord;

use crate::metrics::ReplicationReport;
use crate::objective::ObjectiveWeights;

pub(crate) fn export_runs_impl(
    report: &ReplicationReport,
    weights: &ObjectiveWeights,
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);

    wtr.write_record([
        "run_id",
        "seed",
        "dead_count",
        "average_rpm",
        "total_minutes",
        "average_help_minutes",
        "admitted_count",
        "objective",
    ])?;

    for run in &report.runs {
        let results = &run.results;
        wtr.write_record([
            run.run_id.to_string(),
            run.seed.to_string(),
            results.dead_count.to_string(),
            results.average_rpm.to_string(),
            results.total_minutes.to_string(),
            results.average_help_minutes.to_string(),
            run.admitted_count.to_string(),
            weights.score(results).to_string(),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn export_solution_impl(
    records: &[SolutionRecord],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut wtr = csv::Writer::from_writer(file);
    wtr.write_record([
        "sequence",
        "victim_id",
        "team_id",
        "hospital_department",
        "elapsed_minutes",
    ])?;
    for record in records {
        wtr.write_record([
            record.sequence.to_string(),
            record.victim_id.to_string(),
            record.team_id.to_string(),
            record.hospital_department.clone(),
            record.elapsed_minutes.to_string(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
