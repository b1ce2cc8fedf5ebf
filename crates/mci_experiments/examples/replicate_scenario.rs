//! Example: replicate one scenario and export the results.
//!
//! ```text
//! cargo run -p mci_experiments --example replicate_scenario -- [scenario.json] [runs] [base_seed]
//! ```
//!
//! Defaults to the bundled demo scenario, 50 runs, seed 1. Results land in
//! `replications.csv`, `replications.json` and `best_solution.csv`.

use mci_experiments::{
    export_runs_to_csv, export_solution_to_csv, export_to_json, load_scenario_file, run_replications, summarize,
    ObjectiveWeights, ReplicationConfig,
};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("mci_core=info,mci_experiments=info")),
        )
        .init();

    let mut args = std::env::args().skip(1);
    let path = args
        .next()
        .unwrap_or_else(|| concat!(env!("CARGO_MANIFEST_DIR"), "/data/demo_scenario.json").to_string());
    let runs: usize = args.next().map(|value| value.parse()).transpose()?.unwrap_or(50);
    let base_seed: u64 = args.next().map(|value| value.parse()).transpose()?.unwrap_or(1);

    println!("Loading scenario from {path}...");
    let file = load_scenario_file(&path)?;
    println!(
        "{} victims, {} teams, {} departments",
        file.scenario.total_victims,
        file.scenario.teams.len(),
        file.scenario.departments.len()
    );

    println!("Running {runs} replications...");
    let report = run_replications(&file, &ReplicationConfig::new(runs, base_seed));
    let weights = ObjectiveWeights::default();
    let summary = summarize(&report, &weights);

    println!("\n=== Summary ({} ok, {} failed) ===", summary.runs, summary.failed_runs);
    println!("Dead victims:      {:.2}", summary.mean_dead_count);
    println!("Average RPM:       {:.2}", summary.mean_average_rpm);
    println!("Total time:        {:.1} min", summary.mean_total_minutes);
    println!("Average help time: {:.1} min", summary.mean_average_help_minutes);
    println!("Objective:         {:.2}", summary.mean_objective);
    for failure in &report.failures {
        println!("run {} (seed {}) failed: {}", failure.run_id, failure.seed, failure.error);
    }

    export_runs_to_csv(&report, &weights, "replications.csv")?;
    export_to_json(&report, &summary, "replications.json")?;

    let best = report
        .runs
        .iter()
        .max_by(|a, b| weights.score(&a.results).total_cmp(&weights.score(&b.results)));
    if let Some(best) = best {
        println!("\n=== Best run: seed {} ===", best.seed);
        for record in &best.solution {
            println!("{record}");
        }
        export_solution_to_csv(&best.solution, "best_solution.csv")?;
    }

    println!("\nWrote replications.csv, replications.json and best_solution.csv");
    Ok(())
}
