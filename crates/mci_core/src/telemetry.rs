use std::fmt;

use bevy_ecs::prelude::Resource;
use serde::{Deserialize, Serialize};

use crate::hospital::{DepartmentId, HospitalId};
use crate::team::TeamId;
use crate::victim::VictimId;

/// One admission: which team brought which victim to which department, and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolutionRecord {
    pub sequence: usize,
    pub victim_id: VictimId,
    pub team_id: TeamId,
    /// `"<hospital id>-<department id>"`.
    pub hospital_department: String,
    pub elapsed_minutes: u32,
}

impl fmt::Display for SolutionRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}. (victim id: {}, team id: {}, hospital department id: {}, admission time: {})",
            self.sequence, self.victim_id, self.team_id, self.hospital_department, self.elapsed_minutes
        )
    }
}

/// Append-only admission log, numbered from 1.
#[derive(Debug, Default, Clone, Resource)]
pub struct SolutionLog {
    records: Vec<SolutionRecord>,
}

impl SolutionLog {
    pub fn record(
        &mut self,
        victim_id: VictimId,
        team_id: TeamId,
        hospital: HospitalId,
        department: DepartmentId,
        elapsed_minutes: u32,
    ) -> &SolutionRecord {
        self.records.push(SolutionRecord {
            sequence: self.records.len() + 1,
            victim_id,
            team_id,
            hospital_department: format!("{hospital}-{department}"),
            elapsed_minutes,
        });
        &self.records[self.records.len() - 1]
    }

    pub fn records(&self) -> &[SolutionRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Summary of a finished run. Both averages are rounded to two decimals.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationResults {
    pub dead_count: usize,
    pub average_rpm: f64,
    pub total_minutes: u32,
    /// Mean admission time over admitted victims; 0 when nobody was admitted.
    pub average_help_minutes: f64,
}
