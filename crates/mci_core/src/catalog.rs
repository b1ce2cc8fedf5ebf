use std::io::Read;

use bevy_ecs::prelude::Resource;

use crate::error::SimError;
use crate::victim::{HealthProblem, Procedure};

pub const RECONNAISSANCE: HealthProblem = HealthProblem::new(0, 0);
pub const TRIAGE: HealthProblem = HealthProblem::new(0, 1);

/// Header names accepted for the procedure symbol column (`P(X.Y)`).
const SYMBOL_COLUMNS: &[&str] = &["Procedura medyczna", "procedure"];
/// Header names accepted for the duration column; `-` means "not performed on scene".
const DURATION_COLUMNS: &[&str] = &["Czas wykonania przez ratowników [min]", "duration_minutes"];

/// Procedures the on-scene crews can perform, with fixed durations.
#[derive(Debug, Clone, PartialEq, Resource)]
pub struct TreatmentCatalog {
    procedures: Vec<Procedure>,
    reconnaissance: Procedure,
    triage: Procedure,
}

impl TreatmentCatalog {
    /// Fails when reconnaissance (0.0) or triage (0.1) is missing.
    pub fn new(procedures: Vec<Procedure>) -> Result<Self, SimError> {
        let find = |problem: HealthProblem| {
            procedures
                .iter()
                .find(|procedure| procedure.health_problem == problem)
                .copied()
                .ok_or(SimError::MissingProcedure {
                    discipline: problem.discipline,
                    number: problem.number,
                })
        };
        let reconnaissance = find(RECONNAISSANCE)?;
        let triage = find(TRIAGE)?;
        Ok(Self {
            procedures,
            reconnaissance,
            triage,
        })
    }

    /// The procedures shipped with the bundled scenarios.
    pub fn standard() -> Self {
        let procedures = vec![
            Procedure::new(0, 0, 5),
            Procedure::new(0, 1, 1),
            Procedure::new(15, 1, 2),
            Procedure::new(15, 2, 3),
            Procedure::new(15, 4, 7),
            Procedure::new(15, 5, 7),
            Procedure::new(15, 6, 10),
            Procedure::new(15, 7, 7),
            Procedure::new(15, 8, 4),
            Procedure::new(15, 9, 5),
            Procedure::new(15, 10, 5),
            Procedure::new(15, 11, 4),
            Procedure::new(15, 12, 3),
            Procedure::new(15, 13, 5),
            Procedure::new(15, 14, 5),
        ];
        Self {
            reconnaissance: procedures[0],
            triage: procedures[1],
            procedures,
        }
    }

    /// Loads the `;`-separated procedures table. Rows whose duration is `-`
    /// (or empty) are skipped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SimError> {
        let mut csv = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let column = |names: &[&str]| {
            headers
                .iter()
                .position(|header| names.iter().any(|name| header.trim() == *name))
                .ok_or_else(|| SimError::MalformedTable {
                    row: 1,
                    reason: format!("missing column {:?}", names[0]),
                })
        };
        let symbol_column = column(SYMBOL_COLUMNS)?;
        let duration_column = column(DURATION_COLUMNS)?;

        let mut procedures = Vec::new();
        for (index, record) in csv.records().enumerate() {
            let record = record?;
            let row = index + 2;
            let duration = record.get(duration_column).map(str::trim).unwrap_or("");
            if duration.is_empty() || duration == "-" {
                continue;
            }
            let symbol = record.get(symbol_column).unwrap_or("");
            let health_problem: HealthProblem = symbol.parse().map_err(|err| SimError::MalformedTable {
                row,
                reason: format!("{err}"),
            })?;
            let duration_minutes = duration.parse::<u32>().map_err(|_| SimError::MalformedTable {
                row,
                reason: format!("{duration:?} is not a duration in minutes"),
            })?;
            procedures.push(Procedure {
                health_problem,
                duration_minutes,
            });
        }
        Self::new(procedures)
    }

    pub fn lookup(&self, problem: HealthProblem) -> Option<Procedure> {
        self.procedures
            .iter()
            .find(|procedure| procedure.health_problem == problem)
            .copied()
    }

    pub fn reconnaissance(&self) -> Procedure {
        self.reconnaissance
    }

    pub fn triage(&self) -> Procedure {
        self.triage
    }

    pub fn procedures(&self) -> &[Procedure] {
        &self.procedures
    }
}

impl Default for TreatmentCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
