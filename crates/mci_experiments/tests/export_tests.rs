use std::fs;

use mci_core::test_helpers::{fixture_distance_kind, fixture_params, fixture_reference, fixture_scenario};
use mci_experiments::{
    export_runs_to_csv, export_solution_to_csv, export_to_json, run_replications_with_progress, summarize,
    ObjectiveWeights, ReplicationConfig, ScenarioFile,
};

fn fixture_file() -> ScenarioFile {
    ScenarioFile {
        reference: fixture_reference(),
        scenario: fixture_scenario(),
        params: fixture_params().with_distance_provider(fixture_distance_kind()),
    }
}

#[test]
fn runs_export_one_csv_row_per_replication() {
    let report = run_replications_with_progress(&fixture_file(), &ReplicationConfig::new(3, 1), false);
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("runs.csv");

    export_runs_to_csv(&report, &ObjectiveWeights::default(), &path).expect("export");

    let mut reader = csv::Reader::from_path(&path).expect("readable csv");
    let headers = reader.headers().expect("headers").clone();
    assert_eq!(headers.get(0), Some("run_id"));
    assert_eq!(headers.get(7), Some("objective"));
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().expect("rows");
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[2].get(1), Some("3"));
}

#[test]
fn json_report_carries_summary_and_runs() {
    let report = run_replications_with_progress(&fixture_file(), &ReplicationConfig::new(2, 5), false);
    let summary = summarize(&report, &ObjectiveWeights::default());
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("report.json");

    export_to_json(&report, &summary, &path).expect("export");

    let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).expect("read")).expect("json");
    assert_eq!(value["summary"]["runs"], 2);
    assert_eq!(value["runs"].as_array().map(Vec::len), Some(2));
    assert_eq!(value["failures"].as_array().map(Vec::len), Some(0));
    assert_eq!(value["runs"][0]["seed"], 5);
}

#[test]
fn solution_log_exports_in_admission_order() {
    let report = run_replications_with_progress(&fixture_file(), &ReplicationConfig::new(1, 2), false);
    let run = &report.runs[0];
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join("solution.csv");

    export_solution_to_csv(&run.solution, &path).expect("export");

    let mut reader = csv::Reader::from_path(&path).expect("readable csv");
    let rows: Vec<csv::StringRecord> = reader.records().collect::<Result<_, _>>().expect("rows");
    assert_eq!(rows.len(), run.solution.len());
    for (index, row) in rows.iter().enumerate() {
        assert_eq!(row.get(0), Some(index.to_string().as_str()));
        assert_eq!(row.get(3), Some("1-1"));
    }
}

#[test]
fn demo_scenario_file_loads() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/demo_scenario.json");
    let file = mci_experiments::load_scenario_file(path).expect("demo scenario parses");
    let declared: usize = file.scenario.victims.iter().map(|entry| entry.count).sum();
    assert_eq!(declared, file.scenario.total_victims);
    assert!(!file.scenario.teams.is_empty());
}
