//! Weighted objective over the four result metrics. Higher is better.

use mci_core::telemetry::SimulationResults;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub dead_count: f64,
    pub average_rpm: f64,
    pub total_minutes: f64,
    pub average_help_minutes: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            dead_count: -1.0,
            average_rpm: 4.0,
            total_minutes: -0.25,
            average_help_minutes: -0.3,
        }
    }
}

impl ObjectiveWeights {
    pub fn new(dead_count: f64, average_rpm: f64, total_minutes: f64, average_help_minutes: f64) -> Self {
        Self {
            dead_count,
            average_rpm,
            total_minutes,
            average_help_minutes,
        }
    }

    pub fn score(&self, results: &SimulationResults) -> f64 {
        results.dead_count as f64 * self.dead_count
            + results.average_rpm * self.average_rpm
            + f64::from(results.total_minutes) * self.total_minutes
            + results.average_help_minutes * self.average_help_minutes
    }
}
