use bevy_ecs::prelude::{Entity, World};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::catalog::TreatmentCatalog;
use crate::clock::SimulationClock;
use crate::deterioration::DeteriorationTable;
use crate::error::SimError;
use crate::hospital::{Department, DepartmentId, Hospital, HospitalId};
use crate::incident::IncidentPlace;
use crate::roster::{HospitalRanking, TeamRoster, VictimBuckets};
use crate::routing::{build_distance_provider, Address, DistanceProviderResource};
use crate::scenario::params::{ReconnaissanceLead, SimRng, SimulationFault, SimulationParams};
use crate::team::{Team, TeamId, TeamKind};
use crate::telemetry::SolutionLog;
use crate::victim::{State, Victim, VictimId};

/// One row of the hospital/department reference table. Department ids are
/// unique across hospitals; hospitals are identified by name and address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HospitalDepartmentRecord {
    pub department_id: DepartmentId,
    pub department_name: String,
    pub medical_categories: Vec<u32>,
    pub hospital_name: String,
    pub hospital_address: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamRecord {
    pub id: TeamId,
    pub dispatch_code: String,
    pub kind: TeamKind,
    pub base: Address,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VictimProfile {
    pub name: String,
    pub states: Vec<State>,
}

/// Everything a scenario may refer to by id or name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceData {
    pub hospital_departments: Vec<HospitalDepartmentRecord>,
    pub teams: Vec<TeamRecord>,
    pub profiles: Vec<VictimProfile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentBeds {
    pub department: DepartmentId,
    pub beds: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileCount {
    pub profile: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub departments: Vec<DepartmentBeds>,
    pub teams: Vec<TeamId>,
    pub victims: Vec<ProfileCount>,
    /// Declared total; must equal the sum of the profile counts.
    pub total_victims: usize,
    pub incident_address: Address,
}

/// Populates `world` with the scenario's hospitals, teams and victims plus all
/// orchestrator resources. A `TreatmentCatalog`, `DeteriorationTable` or
/// `DistanceProviderResource` already in the world is kept; otherwise the
/// standard one (or the one `params` describes) is inserted.
pub fn build_scenario(
    world: &mut World,
    scenario: &Scenario,
    reference: &ReferenceData,
    params: SimulationParams,
) -> Result<(), SimError> {
    let declared: usize = scenario.victims.iter().map(|entry| entry.count).sum();
    if declared != scenario.total_victims {
        return Err(SimError::VictimCountMismatch {
            declared: scenario.total_victims,
            actual: declared,
        });
    }

    if !world.contains_resource::<TreatmentCatalog>() {
        world.insert_resource(TreatmentCatalog::standard());
    }
    if !world.contains_resource::<DeteriorationTable>() {
        world.insert_resource(DeteriorationTable::default());
    }
    if !world.contains_resource::<DistanceProviderResource>() {
        world.insert_resource(DistanceProviderResource(build_distance_provider(
            &params.distance_provider,
        )));
    }

    let hospitals = group_hospitals(scenario, reference)?;
    let teams = resolve_teams(scenario, reference)?;
    let victims = create_victims(scenario, reference)?;

    let ranking = {
        let provider = world.resource::<DistanceProviderResource>();
        let mut timed = Vec::with_capacity(hospitals.len());
        for (index, hospital) in hospitals.iter().enumerate() {
            let leg = provider.distance_and_duration(&scenario.incident_address, &hospital.address)?;
            timed.push((index, leg.duration_minutes));
        }
        timed.sort_by(|a, b| a.1.total_cmp(&b.1));
        timed
    };

    let mut rng = SimRng::new(params.seed);

    let hospital_entities: Vec<Entity> = hospitals
        .into_iter()
        .map(|hospital| world.spawn(hospital).id())
        .collect();
    let ranked_hospitals = ranking
        .into_iter()
        .map(|(index, _)| hospital_entities[index])
        .collect();

    let team_entities: Vec<Entity> = teams.into_iter().map(|team| world.spawn(team).id()).collect();

    let mut victim_entities: Vec<Entity> = victims
        .into_iter()
        .map(|victim| world.spawn(victim).id())
        .collect();
    victim_entities.shuffle(&mut rng.0);

    let incident = IncidentPlace::with_reported_fraction(
        scenario.incident_address.clone(),
        victim_entities.clone(),
        params.reported_fraction_min,
        params.reported_fraction_max,
        &mut rng.0,
    );

    info!(
        hospitals = hospital_entities.len(),
        teams = team_entities.len(),
        victims = victim_entities.len(),
        reported = incident.reported_victims_count,
        incident = %incident.address,
        "scenario built"
    );

    world.insert_resource(SimulationClock::default());
    world.insert_resource(SimulationFault::default());
    world.insert_resource(SolutionLog::default());
    world.insert_resource(ReconnaissanceLead::default());
    world.insert_resource(HospitalRanking(ranked_hospitals));
    world.insert_resource(TeamRoster::new(team_entities));
    world.insert_resource(VictimBuckets::new(victim_entities));
    world.insert_resource(incident);
    world.insert_resource(rng);
    world.insert_resource(params);
    Ok(())
}

/// Hospitals in order of first appearance, numbered from 1.
fn group_hospitals(scenario: &Scenario, reference: &ReferenceData) -> Result<Vec<Hospital>, SimError> {
    let mut hospitals: Vec<Hospital> = Vec::new();
    for entry in &scenario.departments {
        let record = reference
            .hospital_departments
            .iter()
            .find(|record| record.department_id == entry.department)
            .ok_or(SimError::UnknownDepartment(entry.department))?;
        let department = Department::new(
            record.department_id,
            record.department_name.clone(),
            record.medical_categories.clone(),
            entry.beds,
        );
        match hospitals.iter_mut().find(|hospital| {
            hospital.name == record.hospital_name && hospital.address.same_place(&record.hospital_address)
        }) {
            Some(hospital) => hospital.departments.push(department),
            None => {
                let id = HospitalId(hospitals.len() as u32 + 1);
                hospitals.push(Hospital::new(
                    id,
                    record.hospital_name.clone(),
                    record.hospital_address.clone(),
                    vec![department],
                ));
            }
        }
    }
    Ok(hospitals)
}

fn resolve_teams(scenario: &Scenario, reference: &ReferenceData) -> Result<Vec<Team>, SimError> {
    scenario
        .teams
        .iter()
        .map(|id| {
            let record = reference
                .teams
                .iter()
                .find(|record| &record.id == id)
                .ok_or_else(|| SimError::UnknownTeam(id.clone()))?;
            Ok(Team::new(
                record.id.clone(),
                record.dispatch_code.clone(),
                record.kind,
                record.base.clone(),
            ))
        })
        .collect()
}

/// Victims numbered from 1 in scenario order.
fn create_victims(scenario: &Scenario, reference: &ReferenceData) -> Result<Vec<Victim>, SimError> {
    let mut victims = Vec::with_capacity(scenario.total_victims);
    for entry in &scenario.victims {
        let profile = reference
            .profiles
            .iter()
            .find(|profile| profile.name == entry.profile)
            .ok_or_else(|| SimError::UnknownProfile(entry.profile.clone()))?;
        if !profile.states.iter().any(|state| state.number == 1) {
            return Err(SimError::MissingInitialState {
                profile: profile.name.clone(),
            });
        }
        for _ in 0..entry.count {
            let id = VictimId(victims.len() as u32 + 1);
            victims.push(Victim::new(id, profile.states.clone())?);
        }
    }
    Ok(victims)
}
