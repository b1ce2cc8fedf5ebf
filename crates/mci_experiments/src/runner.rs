//! Parallel replication of one scenario using rayon.
//!
//! Replication `i` runs with seed `base_seed + i`; runs share nothing, so the
//! report is the same whatever the thread count.

use indicatif::{ProgressBar, ProgressStyle};
use mci_core::error::SimError;
use mci_core::runner::Simulation;
use rayon::prelude::*;
use tracing::{info, warn};

use crate::metrics::{ReplicationReport, RunFailure, RunResult};
use crate::scenario_file::ScenarioFile;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReplicationConfig {
    pub runs: usize,
    pub base_seed: u64,
    /// `None` uses rayon's default pool size.
    pub num_threads: Option<usize>,
}

impl ReplicationConfig {
    pub fn new(runs: usize, base_seed: u64) -> Self {
        Self {
            runs,
            base_seed,
            num_threads: None,
        }
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.num_threads = Some(threads);
        self
    }
}

/// Runs the scenario once with `seed`.
pub fn run_single(file: &ScenarioFile, run_id: usize, seed: u64) -> Result<RunResult, SimError> {
    let params = file.params.clone().with_seed(seed);
    let mut simulation = Simulation::new(&file.scenario, &file.reference, params)?;
    let results = simulation.run()?;
    let solution = simulation.solution().to_vec();
    Ok(RunResult {
        run_id,
        seed,
        results,
        admitted_count: solution.len(),
        solution,
    })
}

pub fn run_replications(file: &ScenarioFile, config: &ReplicationConfig) -> ReplicationReport {
    run_replications_with_progress(file, config, true)
}

pub fn run_replications_with_progress(
    file: &ScenarioFile,
    config: &ReplicationConfig,
    show_progress: bool,
) -> ReplicationReport {
    let pb = if show_progress && config.runs > 0 {
        let bar = ProgressBar::new(config.runs as u64);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")
        {
            bar.set_style(style.progress_chars("#>-"));
        }
        Some(bar)
    } else {
        None
    };

    let replicate = || {
        (0..config.runs)
            .into_par_iter()
            .map(|run_id| {
                let seed = config.base_seed.wrapping_add(run_id as u64);
                let outcome = run_single(file, run_id, seed).map_err(|error| RunFailure {
                    run_id,
                    seed,
                    error: error.to_string(),
                });
                if let Some(progress_bar) = &pb {
                    progress_bar.inc(1);
                }
                outcome
            })
            .collect::<Vec<_>>()
    };

    let pool = config
        .num_threads
        .and_then(|threads| rayon::ThreadPoolBuilder::new().num_threads(threads).build().ok());
    let outcomes = match pool {
        Some(pool) => pool.install(replicate),
        None => replicate(),
    };

    if let Some(progress_bar) = &pb {
        progress_bar.finish_with_message("Completed");
    }

    let mut report = ReplicationReport::default();
    for outcome in outcomes {
        match outcome {
            Ok(run) => report.runs.push(run),
            Err(failure) => {
                warn!(run = failure.run_id, seed = failure.seed, error = %failure.error, "replication failed");
                report.failures.push(failure);
            }
        }
    }
    info!(
        runs = report.runs.len(),
        failures = report.failures.len(),
        "replications finished"
    );
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use mci_core::test_helpers::{fixture_distance_kind, fixture_params, fixture_reference, fixture_scenario};

    fn fixture_file() -> ScenarioFile {
        ScenarioFile {
            reference: fixture_reference(),
            scenario: fixture_scenario(),
            params: fixture_params().with_distance_provider(fixture_distance_kind()),
        }
    }

    #[test]
    fn single_run_admits_the_fixture_victims() {
        let run = run_single(&fixture_file(), 0, 3).expect("fixture run ends");
        assert_eq!(run.seed, 3);
        assert_eq!(run.results.dead_count + run.admitted_count, 4);
        assert_eq!(run.solution.len(), run.admitted_count);
    }

    #[test]
    fn replications_use_consecutive_seeds_in_order() {
        let report = run_replications_with_progress(&fixture_file(), &ReplicationConfig::new(4, 100).with_threads(2), false);
        assert!(report.failures.is_empty());
        let seeds: Vec<u64> = report.runs.iter().map(|run| run.seed).collect();
        assert_eq!(seeds, vec![100, 101, 102, 103]);
    }

    #[test]
    fn replications_match_single_runs() {
        let file = fixture_file();
        let report = run_replications_with_progress(&file, &ReplicationConfig::new(2, 9), false);
        let again = run_single(&file, 1, 10).expect("run ends");
        assert_eq!(report.runs[1], again);
    }

    #[test]
    fn broken_scenario_is_reported_as_failure() {
        let mut file = fixture_file();
        file.scenario.total_victims = 9;
        let report = run_replications_with_progress(&file, &ReplicationConfig::new(2, 0), false);
        assert!(report.runs.is_empty());
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].error.contains("9"));
    }
}
