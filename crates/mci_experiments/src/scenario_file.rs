//! Scenario files: everything one simulation needs, as a single JSON document.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use mci_core::scenario::{ReferenceData, Scenario, SimulationParams};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub reference: ReferenceData,
    pub scenario: Scenario,
    /// Missing fields take their defaults; the seed is overridden per replication.
    #[serde(default)]
    pub params: SimulationParams,
}

pub fn load_scenario_file<P: AsRef<Path>>(path: P) -> Result<ScenarioFile, Box<dyn std::error::Error>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}

impl ScenarioFile {
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
