//! Scenario setup: resolve a scenario against reference data and populate the world.

mod build;
mod params;

pub use build::{
    build_scenario, DepartmentBeds, HospitalDepartmentRecord, ProfileCount, ReferenceData, Scenario,
    TeamRecord, VictimProfile,
};
pub use params::{
    no_fault, ReconnaissanceLead, SimRng, SimulationFault, SimulationParams, DEFAULT_MAX_TICKS,
    DEFAULT_REPORTED_FRACTION_MAX, DEFAULT_REPORTED_FRACTION_MIN,
};
