//! Ambulance teams (ZRM) and their crew members.
//!
//! A team is either idle, driving, or parked with its specialists outside;
//! driving and having specialists outside are mutually exclusive. Travel is
//! a countdown of whole minutes decremented once per tick.

use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

use bevy_ecs::prelude::{Component, Entity};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::hospital::HospitalId;
use crate::routing::{Address, DistanceProvider};
use crate::victim::{Procedure, StateNumber, Victim};

/// Emergency driving is faster than the typical duration a provider reports.
pub const EMERGENCY_SPEED_FACTOR: f64 = 0.64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TeamId(pub String);

impl TeamId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeamKind {
    /// Basic team, two crew members.
    #[serde(rename = "P", alias = "Basic")]
    Basic,
    /// Specialist team with a physician, three crew members.
    #[serde(rename = "S", alias = "Specialist")]
    Specialist,
}

impl TeamKind {
    pub fn crew_size(self) -> usize {
        match self {
            TeamKind::Basic => 2,
            TeamKind::Specialist => 3,
        }
    }
}

impl FromStr for TeamKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "P" => Ok(TeamKind::Basic),
            "S" => Ok(TeamKind::Specialist),
            other => Err(format!("unknown team kind {other:?}")),
        }
    }
}

/// Where a team is headed.
#[derive(Debug, Clone, PartialEq)]
pub enum Destination {
    Hospital {
        entity: Entity,
        id: HospitalId,
        address: Address,
    },
    Incident {
        address: Address,
    },
    Place {
        address: Address,
    },
}

impl Destination {
    pub fn address(&self) -> &Address {
        match self {
            Destination::Hospital { address, .. }
            | Destination::Incident { address }
            | Destination::Place { address } => address,
        }
    }

    pub fn is_incident(&self) -> bool {
        matches!(self, Destination::Incident { .. })
    }
}

/// Travel minutes under emergency driving, rounded up to whole ticks.
pub fn emergency_travel_minutes(duration_minutes: f64, speed_factor: f64) -> u32 {
    (duration_minutes * speed_factor).ceil().max(0.0) as u32
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpecialistTask {
    pub procedure: Procedure,
    pub target: Option<Entity>,
    pub remaining_minutes: u32,
    /// State of the target when work started; a change means the result no longer applies.
    pub state_at_start: Option<StateNumber>,
}

/// A finished task, handed back so the caller can apply it to the victim.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletedProcedure {
    pub procedure: Procedure,
    pub target: Option<Entity>,
    pub state_at_start: Option<StateNumber>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcedureOutcome {
    Critical,
    Supportive,
    /// The victim changed state while being treated; nothing was recorded.
    Stale,
}

impl CompletedProcedure {
    pub fn apply(&self, victim: &mut Victim) -> Result<ProcedureOutcome, SimError> {
        if self.state_at_start != Some(victim.current_state().number) {
            victim.under_procedure = false;
            return Ok(ProcedureOutcome::Stale);
        }
        if victim
            .critical_health_problems()
            .contains(&self.procedure.health_problem)
        {
            victim.perform_procedure(&self.procedure)?;
            Ok(ProcedureOutcome::Critical)
        } else {
            victim.perform_supportive_procedure(&self.procedure);
            Ok(ProcedureOutcome::Supportive)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Specialist {
    pub name: String,
    task: Option<SpecialistTask>,
}

impl Specialist {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            task: None,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.task.is_none()
    }

    pub fn task(&self) -> Option<&SpecialistTask> {
        self.task.as_ref()
    }

    /// Starts a procedure, marking the target victim as under treatment.
    pub fn start_procedure(&mut self, procedure: Procedure, target: Option<(Entity, &mut Victim)>) {
        let (target, state_at_start) = match target {
            Some((entity, victim)) => {
                victim.under_procedure = true;
                (Some(entity), Some(victim.current_state().number))
            }
            None => (None, None),
        };
        self.task = Some(SpecialistTask {
            procedure,
            target,
            remaining_minutes: procedure.duration_minutes,
            state_at_start,
        });
    }

    /// One minute of work; returns the task once it is done.
    pub fn continue_procedure(&mut self) -> Option<CompletedProcedure> {
        let task = self.task.as_mut()?;
        task.remaining_minutes = task.remaining_minutes.saturating_sub(1);
        if task.remaining_minutes > 0 {
            return None;
        }
        self.finish_procedure()
    }

    pub fn finish_procedure(&mut self) -> Option<CompletedProcedure> {
        self.task.take().map(|task| CompletedProcedure {
            procedure: task.procedure,
            target: task.target,
            state_at_start: task.state_at_start,
        })
    }
}

/// What a team reached at the end of a drive.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub destination: Destination,
    pub victim: Option<Entity>,
}

#[derive(Debug, Clone, PartialEq, Component)]
pub struct Team {
    pub id: TeamId,
    pub dispatch_code: String,
    pub kind: TeamKind,
    pub specialists: Vec<Specialist>,
    pub origin: Address,
    target: Option<Destination>,
    transported_victim: Option<Entity>,
    remaining_travel_minutes: Option<u32>,
    queue: VecDeque<Destination>,
    specialists_outside: bool,
}

impl Team {
    pub fn new(id: TeamId, dispatch_code: impl Into<String>, kind: TeamKind, origin: Address) -> Self {
        let specialists = (1..=kind.crew_size())
            .map(|n| Specialist::new(format!("{id}/{n}")))
            .collect();
        Self {
            id,
            dispatch_code: dispatch_code.into(),
            kind,
            specialists,
            origin,
            target: None,
            transported_victim: None,
            remaining_travel_minutes: None,
            queue: VecDeque::new(),
            specialists_outside: false,
        }
    }

    pub fn target(&self) -> Option<&Destination> {
        self.target.as_ref()
    }

    pub fn transported_victim(&self) -> Option<Entity> {
        self.transported_victim
    }

    pub fn remaining_travel_minutes(&self) -> Option<u32> {
        self.remaining_travel_minutes
    }

    pub fn is_driving(&self) -> bool {
        self.remaining_travel_minutes.is_some()
    }

    pub fn is_transporting(&self) -> bool {
        self.transported_victim.is_some()
    }

    pub fn are_specialists_outside(&self) -> bool {
        self.specialists_outside
    }

    pub fn has_queue(&self) -> bool {
        !self.queue.is_empty()
    }

    pub fn queue(&self) -> impl Iterator<Item = &Destination> {
        self.queue.iter()
    }

    pub fn specialists_idle(&self) -> bool {
        self.specialists.iter().all(Specialist::is_idle)
    }

    fn ensure_can_drive(&self) -> Result<(), SimError> {
        if self.is_driving() {
            return Err(SimError::AlreadyDriving {
                team: self.id.clone(),
            });
        }
        if self.specialists_outside {
            return Err(SimError::SpecialistsOutside {
                team: self.id.clone(),
            });
        }
        Ok(())
    }

    /// Leaves the team untouched on failure.
    pub fn start_driving(
        &mut self,
        target: Destination,
        provider: &dyn DistanceProvider,
        speed_factor: f64,
    ) -> Result<(), SimError> {
        self.ensure_can_drive()?;
        let leg = provider.distance_and_duration(&self.origin, target.address())?;
        self.remaining_travel_minutes = Some(emergency_travel_minutes(leg.duration_minutes, speed_factor));
        self.target = Some(target);
        Ok(())
    }

    pub fn start_transporting(
        &mut self,
        victim: Entity,
        target: Destination,
        provider: &dyn DistanceProvider,
        speed_factor: f64,
    ) -> Result<(), SimError> {
        self.start_driving(target, provider, speed_factor)?;
        self.transported_victim = Some(victim);
        Ok(())
    }

    /// Advances travel by one minute. On arrival the team takes the
    /// destination as its new origin and, if the next queued target is an
    /// incident, sets off towards it straight away.
    pub fn drive_or_finish(
        &mut self,
        provider: &dyn DistanceProvider,
        speed_factor: f64,
    ) -> Result<Option<Arrival>, SimError> {
        let Some(remaining) = self.remaining_travel_minutes else {
            return Ok(None);
        };
        let remaining = remaining.saturating_sub(1);
        if remaining > 0 {
            self.remaining_travel_minutes = Some(remaining);
            return Ok(None);
        }

        self.remaining_travel_minutes = None;
        let Some(destination) = self.target.take() else {
            return Ok(None);
        };
        self.origin = destination.address().clone();
        let arrival = Arrival {
            destination,
            victim: self.transported_victim.take(),
        };

        if self.queue.front().is_some_and(Destination::is_incident) {
            if let Some(next) = self.queue.pop_front() {
                self.start_driving(next, provider, speed_factor)?;
            }
        }
        Ok(Some(arrival))
    }

    pub fn queue_target(&mut self, destination: Destination) {
        self.queue.push_back(destination);
    }

    pub fn next_queued(&mut self) -> Option<Destination> {
        self.queue.pop_front()
    }

    pub fn leave_vehicle(&mut self) -> Result<(), SimError> {
        if self.is_driving() {
            return Err(SimError::LeaveWhileDriving {
                team: self.id.clone(),
            });
        }
        self.specialists_outside = true;
        Ok(())
    }

    /// Succeeds only when every specialist is idle.
    pub fn try_return_to_vehicle(&mut self) -> bool {
        if !self.specialists_idle() {
            return false;
        }
        self.specialists_outside = false;
        true
    }

    pub fn continue_procedures(&mut self) -> Vec<CompletedProcedure> {
        self.specialists
            .iter_mut()
            .filter_map(Specialist::continue_procedure)
            .collect()
    }

    /// Typical minutes until this team could reach `address`: the rest of the
    /// current drive plus the leg onwards, or the leg from where it stands.
    pub fn projected_minutes_to(
        &self,
        address: &Address,
        provider: &dyn DistanceProvider,
    ) -> Result<f64, SimError> {
        match (&self.target, self.remaining_travel_minutes) {
            (Some(target), Some(remaining)) => {
                let onwards = provider.distance_and_duration(target.address(), address)?;
                Ok(f64::from(remaining) + onwards.duration_minutes)
            }
            _ => Ok(provider.distance_and_duration(&self.origin, address)?.duration_minutes),
        }
    }
}
