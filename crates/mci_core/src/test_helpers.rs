//! Test helpers for common test setup and utilities.
//!
//! The fixture is a small incident in Krakow: four victims of two profiles,
//! one university hospital with three departments, and ambulance teams from
//! three stations. Travel times come from a fixed table so runs do not depend
//! on geography.

use bevy_ecs::prelude::World;

use crate::error::SimError;
use crate::hospital::DepartmentId;
use crate::routing::{
    Address, DistanceProviderKind, DistanceProviderResource, TableDistanceProvider, TableLeg,
};
use crate::scenario::{
    build_scenario, DepartmentBeds, HospitalDepartmentRecord, ProfileCount, ReferenceData, Scenario,
    SimulationParams, TeamRecord, VictimProfile,
};
use crate::team::{TeamId, TeamKind};
use crate::victim::{HealthProblem, State, TriageColour};

pub const FIXTURE_SEED: u64 = 7;

pub const INCIDENT: &str = "Krakow, Rynek Glowny 1";
pub const HOSPITAL: &str = "Krakow, ul. Jakubowskiego 2";
pub const STATION_CITY: &str = "Krakow, ul. Sw. Lazarza 14";
pub const STATION_CHRZANOW: &str = "Chrzanow, ul. Sokola 3";
pub const STATION_OLKUSZ: &str = "Olkusz, ul. Mickiewicza 1";

pub const TEAM_CITY: &str = "K01 47";
pub const TEAM_CHRZANOW: &str = "DM06-01";
pub const TEAM_OLKUSZ: &str = "K12 03";

pub fn incident_address() -> Address {
    Address::with_coordinates(INCIDENT, 50.0617, 19.9373)
}

pub fn hospital_address() -> Address {
    Address::with_coordinates(HOSPITAL, 50.0089, 20.0059)
}

/// Travel legs covering every pair the fixture can ask for: (from, to, km, minutes).
pub const FIXTURE_LEGS: [(&str, &str, f64, f64); 7] = [
    (STATION_CITY, INCIDENT, 3.1, 8.0),
    (STATION_CHRZANOW, INCIDENT, 46.0, 40.0),
    (STATION_OLKUSZ, INCIDENT, 43.0, 55.0),
    (INCIDENT, HOSPITAL, 8.7, 15.0),
    (STATION_CITY, HOSPITAL, 7.9, 12.0),
    (STATION_CHRZANOW, HOSPITAL, 49.0, 38.0),
    (STATION_OLKUSZ, HOSPITAL, 45.0, 50.0),
];

pub fn fixture_distance_table() -> TableDistanceProvider {
    FIXTURE_LEGS
        .iter()
        .fold(TableDistanceProvider::new(), |table, &(from, to, km, minutes)| {
            table.with_leg(from, to, km, minutes)
        })
}

/// The same legs as a serializable provider description.
pub fn fixture_distance_kind() -> DistanceProviderKind {
    DistanceProviderKind::Table {
        legs: FIXTURE_LEGS
            .iter()
            .map(|&(from, to, distance_km, duration_minutes)| TableLeg {
                from: from.to_string(),
                to: to.to_string(),
                distance_km,
                duration_minutes,
            })
            .collect(),
    }
}

/// Not walking, RR 12, pulse 120, following orders: RPM 4 + 4 + 3 = 11.
pub fn profile_abdominal() -> VictimProfile {
    VictimProfile {
        name: "abdominal".to_string(),
        states: vec![State::new(1, TriageColour::Yellow)
            .with_vitals(false, 12, 120, true)
            .with_health_problems([HealthProblem::new(25, 1), HealthProblem::new(25, 4)])
            .with_description("blunt abdominal trauma")],
    }
}

/// Pulse 130 instead of 120: RPM 4 + 3 + 3 = 10.
pub fn profile_pelvic() -> VictimProfile {
    VictimProfile {
        name: "pelvic".to_string(),
        states: vec![State::new(1, TriageColour::Yellow)
            .with_vitals(false, 12, 130, true)
            .with_health_problems([HealthProblem::new(25, 2)])
            .with_description("suspected pelvic fracture")],
    }
}

/// Red until 15.1 and 15.4 are done, then a stable yellow trauma patient.
/// Untreated, it turns black after 150 minutes.
pub fn profile_crush_injury() -> VictimProfile {
    VictimProfile {
        name: "crush_injury".to_string(),
        states: vec![
            State::new(1, TriageColour::Red)
                .with_vitals(false, 30, 130, false)
                .with_health_problems([HealthProblem::new(15, 1), HealthProblem::new(15, 4)])
                .with_intervention_transition([HealthProblem::new(15, 1), HealthProblem::new(15, 4)], 2)
                .with_timed_transition(150, 3)
                .with_description("crushed lower limbs, haemorrhage"),
            State::new(2, TriageColour::Yellow)
                .with_vitals(false, 20, 100, true)
                .with_health_problems([HealthProblem::new(25, 3)])
                .with_description("limbs immobilised, bleeding controlled"),
            State::new(3, TriageColour::Black),
        ],
    }
}

/// Dies five minutes into the incident, before any team can arrive.
pub fn profile_cardiac_arrest() -> VictimProfile {
    VictimProfile {
        name: "cardiac_arrest".to_string(),
        states: vec![
            State::new(1, TriageColour::Red)
                .with_vitals(false, 6, 35, false)
                .with_health_problems([HealthProblem::new(25, 5)])
                .with_timed_transition(5, 2),
            State::new(2, TriageColour::Black),
        ],
    }
}

/// Ready for transport once triaged; turns black after 12 minutes.
pub fn profile_internal_bleeding() -> VictimProfile {
    VictimProfile {
        name: "internal_bleeding".to_string(),
        states: vec![
            State::new(1, TriageColour::Yellow)
                .with_vitals(false, 28, 125, true)
                .with_health_problems([HealthProblem::new(25, 3)])
                .with_timed_transition(12, 2)
                .with_description("ruptured spleen"),
            State::new(2, TriageColour::Black),
        ],
    }
}

pub fn fixture_reference() -> ReferenceData {
    let hospital = |id, name: &str, categories: Vec<u32>| HospitalDepartmentRecord {
        department_id: DepartmentId(id),
        department_name: name.to_string(),
        medical_categories: categories,
        hospital_name: "Szpital Uniwersytecki".to_string(),
        hospital_address: hospital_address(),
    };
    let team = |id: &str, code: &str, kind, base: &str| TeamRecord {
        id: TeamId::new(id),
        dispatch_code: code.to_string(),
        kind,
        base: Address::new(base),
    };
    ReferenceData {
        hospital_departments: vec![
            hospital(1, "Klinika Chirurgii Urazowej", vec![25]),
            hospital(4, "Oddzial Chirurgii Naczyniowej", vec![39, 37]),
            hospital(6, "SOR", vec![15]),
        ],
        teams: vec![
            team(TEAM_CITY, "K01", TeamKind::Basic, STATION_CITY),
            team(TEAM_CHRZANOW, "DM06", TeamKind::Specialist, STATION_CHRZANOW),
            team(TEAM_OLKUSZ, "K12", TeamKind::Basic, STATION_OLKUSZ),
        ],
        profiles: vec![
            profile_abdominal(),
            profile_pelvic(),
            profile_crush_injury(),
            profile_cardiac_arrest(),
            profile_internal_bleeding(),
        ],
    }
}

/// Two teams, two victims of each profile.
pub fn fixture_scenario() -> Scenario {
    Scenario {
        departments: vec![
            DepartmentBeds {
                department: DepartmentId(1),
                beds: 22,
            },
            DepartmentBeds {
                department: DepartmentId(4),
                beds: 15,
            },
            DepartmentBeds {
                department: DepartmentId(6),
                beds: 12,
            },
        ],
        teams: vec![TeamId::new(TEAM_CITY), TeamId::new(TEAM_CHRZANOW)],
        victims: vec![
            ProfileCount {
                profile: "abdominal".to_string(),
                count: 2,
            },
            ProfileCount {
                profile: "pelvic".to_string(),
                count: 2,
            },
        ],
        total_victims: 4,
        incident_address: incident_address(),
    }
}

pub fn fixture_params() -> SimulationParams {
    SimulationParams::default().with_seed(FIXTURE_SEED)
}

/// Builds `scenario` into a fresh world that routes over the fixture table.
pub fn build_world_with(
    scenario: &Scenario,
    params: SimulationParams,
) -> Result<World, SimError> {
    let mut world = World::new();
    world.insert_resource(DistanceProviderResource(Box::new(fixture_distance_table())));
    build_scenario(&mut world, scenario, &fixture_reference(), params)?;
    Ok(world)
}

/// The standard fixture world, seeded.
pub fn create_test_world() -> Result<World, SimError> {
    build_world_with(&fixture_scenario(), fixture_params())
}
