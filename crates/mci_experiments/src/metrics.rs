//! Per-run results and their aggregation across replications.

use mci_core::telemetry::{SimulationResults, SolutionRecord};
use serde::{Deserialize, Serialize};

use crate::objective::ObjectiveWeights;

/// Outcome of one finished replication.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    pub run_id: usize,
    pub seed: u64,
    pub results: SimulationResults,
    pub admitted_count: usize,
    /// Admission log of the run, in order.
    pub solution: Vec<SolutionRecord>,
}

/// A replication that stopped with an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunFailure {
    pub run_id: usize,
    pub seed: u64,
    pub error: String,
}

/// All replications of one scenario, ordered by run id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReplicationReport {
    pub runs: Vec<RunResult>,
    pub failures: Vec<RunFailure>,
}

/// Means over the successful runs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ReplicationSummary {
    pub runs: usize,
    pub failed_runs: usize,
    pub mean_dead_count: f64,
    pub mean_average_rpm: f64,
    pub mean_total_minutes: f64,
    pub mean_average_help_minutes: f64,
    pub mean_objective: f64,
    pub best_objective: Option<f64>,
}

fn mean(values: impl Iterator<Item = f64>, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        values.sum::<f64>() / count as f64
    }
}

pub fn summarize(report: &ReplicationReport, weights: &ObjectiveWeights) -> ReplicationSummary {
    let runs = &report.runs;
    let count = runs.len();
    let objectives: Vec<f64> = runs.iter().map(|run| weights.score(&run.results)).collect();
    ReplicationSummary {
        runs: count,
        failed_runs: report.failures.len(),
        mean_dead_count: mean(runs.iter().map(|run| run.results.dead_count as f64), count),
        mean_average_rpm: mean(runs.iter().map(|run| run.results.average_rpm), count),
        mean_total_minutes: mean(runs.iter().map(|run| f64::from(run.results.total_minutes)), count),
        mean_average_help_minutes: mean(runs.iter().map(|run| run.results.average_help_minutes), count),
        mean_objective: mean(objectives.iter().copied(), count),
        best_objective: objectives.iter().copied().reduce(f64::max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(run_id: usize, dead_count: usize, total_minutes: u32) -> RunResult {
        RunResult {
            run_id,
            seed: run_id as u64,
            results: SimulationResults {
                dead_count,
                average_rpm: 10.0,
                total_minutes,
                average_help_minutes: 30.0,
            },
            admitted_count: 4 - dead_count,
            solution: Vec::new(),
        }
    }

    #[test]
    fn summary_averages_successful_runs() {
        let report = ReplicationReport {
            runs: vec![run(0, 0, 60), run(1, 2, 100)],
            failures: vec![RunFailure {
                run_id: 2,
                seed: 2,
                error: "tick limit".to_string(),
            }],
        };
        let weights = ObjectiveWeights::default();
        let summary = summarize(&report, &weights);

        assert_eq!(summary.runs, 2);
        assert_eq!(summary.failed_runs, 1);
        assert_eq!(summary.mean_dead_count, 1.0);
        assert_eq!(summary.mean_total_minutes, 80.0);
        let first = weights.score(&report.runs[0].results);
        assert_eq!(summary.best_objective, Some(first));
    }

    #[test]
    fn empty_report_summarizes_to_zero() {
        let summary = summarize(&ReplicationReport::default(), &ObjectiveWeights::default());
        assert_eq!(summary.runs, 0);
        assert_eq!(summary.mean_objective, 0.0);
        assert_eq!(summary.best_objective, None);
    }
}
