//! Error taxonomy for the simulation engine.
//!
//! Every variant carries enough context (team, victim, hospital, location) to
//! diagnose a malformed scenario. Recoverable lookups elsewhere return
//! `Option` instead of one of these.

use bevy_ecs::prelude::Entity;

use crate::hospital::{DepartmentId, HospitalId};
use crate::routing::RoutingError;
use crate::team::TeamId;
use crate::victim::{HealthProblem, StateNumber, VictimId};

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error("routing failed: {0}")]
    Routing(#[from] RoutingError),

    #[error("team {team} is already driving")]
    AlreadyDriving { team: TeamId },

    #[error("team {team} cannot drive while its specialists are outside the vehicle")]
    SpecialistsOutside { team: TeamId },

    #[error("team {team} cannot leave the vehicle while driving")]
    LeaveWhileDriving { team: TeamId },

    #[error("team {team} arrived with victim {victim} at {location}, which is not a hospital")]
    PassengerAtNonHospital {
        team: TeamId,
        victim: VictimId,
        location: String,
    },

    #[error("victim {victim} has no state numbered {state}")]
    UnknownState { victim: VictimId, state: StateNumber },

    #[error("procedure {problem} is not critical for victim {victim}")]
    WrongProcedure {
        victim: VictimId,
        problem: HealthProblem,
    },

    #[error("hospital {hospital} has no department able to admit victim {victim}")]
    NoMatchingDepartment {
        hospital: HospitalId,
        victim: VictimId,
    },

    #[error("department {department} of hospital {hospital} has no free beds")]
    NoFreeBeds {
        hospital: HospitalId,
        department: DepartmentId,
    },

    #[error("victim {victim} already holds a reservation in hospital {hospital}")]
    AlreadyReserved {
        hospital: HospitalId,
        victim: VictimId,
    },

    #[error("no hospital can admit victim {victim}")]
    NoAvailableHospital { victim: VictimId },

    #[error("no team without a queue is available to collect victim {victim}")]
    NoTeamWithoutQueue { victim: VictimId },

    #[error("no team is available to dispatch to {location}")]
    NoTeamsAvailable { location: String },

    #[error("treatment catalog has no procedure {discipline}.{number}")]
    MissingProcedure { discipline: u32, number: u32 },

    #[error("simulation has not finished yet")]
    NotFinished,

    #[error("simulation did not finish within {ticks} minutes")]
    TickLimitExceeded { ticks: u32 },

    #[error("scenario declares {declared} victims but its profiles add up to {actual}")]
    VictimCountMismatch { declared: usize, actual: usize },

    #[error("scenario references unknown department {0}")]
    UnknownDepartment(DepartmentId),

    #[error("scenario references unknown team {0}")]
    UnknownTeam(TeamId),

    #[error("scenario references unknown victim profile {0:?}")]
    UnknownProfile(String),

    #[error("victim profile {profile:?} has no initial state numbered 1")]
    MissingInitialState { profile: String },

    #[error("invalid state {state}: {reason}")]
    InvalidState { state: StateNumber, reason: String },

    #[error("malformed table row {row}: {reason}")]
    MalformedTable { row: usize, reason: String },

    #[error("entity {0:?} is missing from the world")]
    MissingEntity(Entity),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}
