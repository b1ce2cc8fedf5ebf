//! The orchestrator's decision logic, bundled as a [`SystemParam`] so every
//! system of the tick works on the same view of teams, victims and hospitals.
//!
//! Iteration always follows the roster and bucket vectors, never query order,
//! so a seeded run is reproducible.

use bevy_ecs::prelude::{Entity, Query, Res, ResMut};
use bevy_ecs::query::QueryEntityError;
use bevy_ecs::system::SystemParam;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::catalog::TreatmentCatalog;
use crate::clock::SimulationClock;
use crate::dispatch::{priority_key, rank_by_arrival};
use crate::error::SimError;
use crate::hospital::Hospital;
use crate::incident::IncidentPlace;
use crate::roster::{Bucket, HospitalRanking, TeamRoster, VictimBuckets};
use crate::routing::{Address, DistanceProviderResource};
use crate::scenario::{ReconnaissanceLead, SimRng, SimulationParams};
use crate::team::{Arrival, Destination, ProcedureOutcome, Team};
use crate::telemetry::SolutionLog;
use crate::victim::{Procedure, Victim};

trait OrMissing<T> {
    fn or_missing(self, entity: Entity) -> Result<T, SimError>;
}

impl<T> OrMissing<T> for Result<T, QueryEntityError> {
    fn or_missing(self, entity: Entity) -> Result<T, SimError> {
        self.map_err(|_| SimError::MissingEntity(entity))
    }
}

#[derive(SystemParam)]
pub struct IncidentCommand<'w, 's> {
    pub clock: Res<'w, SimulationClock>,
    pub params: Res<'w, SimulationParams>,
    pub provider: Res<'w, DistanceProviderResource>,
    pub catalog: Res<'w, TreatmentCatalog>,
    pub ranking: Res<'w, HospitalRanking>,
    pub incident: ResMut<'w, IncidentPlace>,
    pub buckets: ResMut<'w, VictimBuckets>,
    pub roster: ResMut<'w, TeamRoster>,
    pub solution: ResMut<'w, SolutionLog>,
    pub rng: ResMut<'w, SimRng>,
    pub lead: ResMut<'w, ReconnaissanceLead>,
    pub teams: Query<'w, 's, &'static mut Team>,
    pub victims: Query<'w, 's, &'static mut Victim>,
    pub hospitals: Query<'w, 's, &'static mut Hospital>,
}

impl<'w, 's> IncidentCommand<'w, 's> {
    fn incident_destination(&self) -> Destination {
        Destination::Incident {
            address: self.incident.address.clone(),
        }
    }

    /// Teams among `candidates` ready for a new destination, fastest to `address` first.
    fn rank_teams(&self, candidates: &[Entity], address: &Address) -> Result<Vec<Entity>, SimError> {
        let mut teams = Vec::with_capacity(candidates.len());
        for &entity in candidates {
            teams.push((entity, self.teams.get(entity).or_missing(entity)?));
        }
        let ranked = rank_by_arrival(teams, address, &**self.provider)?;
        Ok(ranked.into_iter().map(|(entity, _)| entity).collect())
    }

    fn start_drive(&mut self, team: Entity, destination: Destination) -> Result<(), SimError> {
        let factor = self.params.emergency_speed_factor;
        let mut team = self.teams.get_mut(team).or_missing(team)?;
        team.start_driving(destination, &**self.provider, factor)
    }

    /// Sends the `count` idle teams that would arrive first. Returns the
    /// fastest team, or `None` when no idle team is free.
    pub fn dispatch_wave(&mut self, count: usize) -> Result<Option<Entity>, SimError> {
        let idle = self.roster.idle().to_vec();
        let ranked = self.rank_teams(&idle, &self.incident.address.clone())?;
        for &team in ranked.iter().take(count) {
            self.start_drive(team, self.incident_destination())?;
            self.roster.team_into_action(team);
            debug!(team = %self.team_id(team), "dispatched to incident");
        }
        info!(
            requested = count,
            sent = ranked.len().min(count),
            minute = self.clock.now(),
            "dispatch wave"
        );
        Ok(ranked.first().copied())
    }

    fn team_id(&self, team: Entity) -> String {
        self.teams
            .get(team)
            .map(|team| team.id.to_string())
            .unwrap_or_default()
    }

    // ------------------------------------------------------------------
    // Movement and admission
    // ------------------------------------------------------------------

    pub fn advance_team(&mut self, team_entity: Entity) -> Result<(), SimError> {
        let factor = self.params.emergency_speed_factor;
        let (arrival, team_id) = {
            let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
            let arrival = team.drive_or_finish(&**self.provider, factor)?;
            (arrival, team.id.clone())
        };
        let Some(Arrival {
            destination,
            victim: Some(victim),
        }) = arrival
        else {
            return Ok(());
        };

        match destination {
            Destination::Hospital { entity, .. } => self.deliver(team_entity, entity, victim),
            other => {
                let victim_id = self.victims.get(victim).or_missing(victim)?.id;
                Err(SimError::PassengerAtNonHospital {
                    team: team_id,
                    victim: victim_id,
                    location: other.address().label.clone(),
                })
            }
        }
    }

    /// Releases the reservation, then files a dead passenger as assessed or
    /// admits a living one and logs the admission.
    fn deliver(&mut self, team: Entity, hospital: Entity, victim: Entity) -> Result<(), SimError> {
        let now = self.clock.now();
        let team_id = self.teams.get(team).or_missing(team)?.id.clone();
        let mut hospital = self.hospitals.get_mut(hospital).or_missing(hospital)?;
        let mut patient = self.victims.get_mut(victim).or_missing(victim)?;

        hospital.remove_from_incoming(patient.id);
        if patient.is_dead() {
            self.buckets.transfer(victim, Bucket::InTransport, Bucket::Assessed);
            warn!(victim = %patient.id, team = %team_id, hospital = %hospital.id, "victim died in transport");
            return Ok(());
        }

        let department = hospital.admit_to_department(&mut patient, now)?;
        self.buckets.transfer(victim, Bucket::InTransport, Bucket::Admitted);
        let record = self
            .solution
            .record(patient.id, team_id, hospital.id, department, now);
        info!(%record, "admitted");
        Ok(())
    }

    pub fn progress_procedures(&mut self, team_entity: Entity) -> Result<(), SimError> {
        let (completed, team_id) = {
            let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
            (team.continue_procedures(), team.id.clone())
        };
        for done in completed {
            let Some(target) = done.target else {
                continue;
            };
            let mut victim = self.victims.get_mut(target).or_missing(target)?;
            let problem = done.procedure.health_problem;
            match done.apply(&mut victim)? {
                ProcedureOutcome::Stale => warn!(
                    victim = %victim.id,
                    team = %team_id,
                    %problem,
                    "victim changed state during procedure, result discarded"
                ),
                outcome => debug!(
                    victim = %victim.id,
                    team = %team_id,
                    %problem,
                    ?outcome,
                    state = victim.current_state().number,
                    "procedure finished"
                ),
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Reconnaissance
    // ------------------------------------------------------------------

    /// The lead team disembarks and scouts the scene; when its crew is idle
    /// again the true count is known and extra teams are sent for the victims
    /// nobody reported.
    pub fn reconnaissance(&mut self) -> Result<(), SimError> {
        if !self.incident.needs_reconnaissance() {
            return Ok(());
        }
        let Some(lead) = self.lead.0 else {
            return Ok(());
        };
        let reconnaissance = self.catalog.reconnaissance();
        let mut team = self.teams.get_mut(lead).or_missing(lead)?;

        if !team.are_specialists_outside() {
            if !team.is_driving() {
                team.leave_vehicle()?;
                for specialist in &mut team.specialists {
                    specialist.start_procedure(reconnaissance, None);
                }
                debug!(team = %team.id, "reconnaissance started");
            }
            return Ok(());
        }
        if !team.specialists_idle() {
            return Ok(());
        }

        let newly_found = self.incident.complete_reconnaissance();
        info!(
            team = %team.id,
            newly_found,
            total = self.incident.true_victim_count(),
            minute = self.clock.now(),
            "reconnaissance complete"
        );
        drop(team);
        if newly_found > 0 && !self.roster.idle().is_empty() {
            self.dispatch_wave(newly_found)?;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Team orders
    // ------------------------------------------------------------------

    pub fn order_team(&mut self, team_entity: Entity) -> Result<(), SimError> {
        let team = self.teams.get(team_entity).or_missing(team_entity)?;
        if !team.is_driving() && !team.are_specialists_outside() {
            self.order_idle_team(team_entity)?;
        }
        let team = self.teams.get(team_entity).or_missing(team_entity)?;
        if team.are_specialists_outside() && team.specialists_idle() {
            self.order_idle_specialists(team_entity)?;
        }
        Ok(())
    }

    fn order_idle_team(&mut self, team_entity: Entity) -> Result<(), SimError> {
        let incident_address = self.incident.address.clone();
        let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;

        if let Some(next) = team.next_queued() {
            debug!(team = %team.id, to = %next.address(), "driving to queued target");
            drop(team);
            return self.start_drive(team_entity, next);
        }
        if !team.origin.same_place(&incident_address) {
            debug!(team = %team.id, "returning to incident");
            drop(team);
            return self.start_drive(team_entity, self.incident_destination());
        }
        if !self.buckets.is_empty(Bucket::TransportReady) {
            drop(team);
            return self.handle_transport_ready(team_entity);
        }
        debug!(team = %team.id, "specialists leave the vehicle");
        team.leave_vehicle()
    }

    fn sorted_by_priority(&self, bucket: Bucket) -> Result<Vec<Entity>, SimError> {
        let mut keyed = Vec::new();
        for &entity in self.buckets.get(bucket) {
            keyed.push((priority_key(self.victims.get(entity).or_missing(entity)?), entity));
        }
        keyed.sort();
        Ok(keyed.into_iter().map(|(_, entity)| entity).collect())
    }

    /// Loads the most urgent living transport-ready victim and drives it to the
    /// nearest hospital with a free bed, reserving that bed. Dead victims found
    /// on the way are filed back as assessed.
    fn handle_transport_ready(&mut self, team_entity: Entity) -> Result<(), SimError> {
        for victim_entity in self.sorted_by_priority(Bucket::TransportReady)? {
            let victim = self.victims.get(victim_entity).or_missing(victim_entity)?;
            if victim.is_dead() {
                self.buckets
                    .transfer(victim_entity, Bucket::TransportReady, Bucket::Assessed);
                continue;
            }
            let victim_id = victim.id;

            let mut chosen = None;
            for &hospital_entity in &self.ranking.0 {
                let mut hospital = self
                    .hospitals
                    .get_mut(hospital_entity)
                    .or_missing(hospital_entity)?;
                if hospital.can_admit(victim)? {
                    chosen = Some(Destination::Hospital {
                        entity: hospital_entity,
                        id: hospital.id,
                        address: hospital.address.clone(),
                    });
                    break;
                }
            }
            let Some(destination) = chosen else {
                return Err(SimError::NoAvailableHospital { victim: victim_id });
            };

            let factor = self.params.emergency_speed_factor;
            let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
            debug!(team = %team.id, victim = %victim_id, hospital = %destination.address(), "transport");
            team.start_transporting(victim_entity, destination, &**self.provider, factor)?;
            self.buckets
                .transfer(victim_entity, Bucket::TransportReady, Bucket::InTransport);
            self.incident.try_take_victim(victim_entity);
            break;
        }
        Ok(())
    }

    fn order_idle_specialists(&mut self, team_entity: Entity) -> Result<(), SimError> {
        let crew = self.teams.get(team_entity).or_missing(team_entity)?.specialists.len();
        for index in 0..crew {
            if !self.buckets.is_empty(Bucket::Unknown) {
                self.triage(team_entity, index)?;
            } else if self.any_assessed_needing_procedures()? {
                self.help_or_prepare_for_transport(team_entity, index)?;
            } else {
                self.teams
                    .get_mut(team_entity)
                    .or_missing(team_entity)?
                    .try_return_to_vehicle();
            }
        }
        Ok(())
    }

    /// Picks a random unknown-status victim and triages it.
    fn triage(&mut self, team_entity: Entity, specialist: usize) -> Result<(), SimError> {
        let unknown = self.buckets.get(Bucket::Unknown);
        let victim = unknown[self.rng.0.gen_range(0..unknown.len())];
        self.buckets.transfer(victim, Bucket::Unknown, Bucket::Assessed);

        let triage = self.catalog.triage();
        let victim_id = self.victims.get(victim).or_missing(victim)?.id;
        let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
        team.specialists[specialist].start_procedure(triage, None);
        debug!(team = %team.id, victim = %victim_id, "triage");
        Ok(())
    }

    fn any_assessed_needing_procedures(&self) -> Result<bool, SimError> {
        for &entity in self.buckets.get(Bucket::Assessed) {
            let victim = self.victims.get(entity).or_missing(entity)?;
            if !victim.is_dead() && !victim.under_procedure {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Worst-off assessed victim nobody is treating.
    fn target_victim_for_procedure(&self) -> Result<Option<Entity>, SimError> {
        let mut best: Option<(_, Entity)> = None;
        for &entity in self.buckets.get(Bucket::Assessed) {
            let victim = self.victims.get(entity).or_missing(entity)?;
            if victim.is_dead() || victim.under_procedure {
                continue;
            }
            let key = priority_key(victim);
            if best.as_ref().map_or(true, |(best_key, _)| key < *best_key) {
                best = Some((key, entity));
            }
        }
        Ok(best.map(|(_, entity)| entity))
    }

    /// Assigns the specialist to the worst-off victim that still needs work.
    /// Victims with nothing left to treat are handed over for transport.
    ///
    /// When no action team is free to queue the incident, the victim stays
    /// transport-ready and the loop stops instead of failing the run. It is
    /// picked up by the next team that stands at the incident with its crew
    /// aboard, so the run still ends.
    fn help_or_prepare_for_transport(&mut self, team_entity: Entity, specialist: usize) -> Result<(), SimError> {
        while let Some(target) = self.target_victim_for_procedure()? {
            let victim = self.victims.get(target).or_missing(target)?;
            let critical = victim.critical_health_problems();

            let procedure = if critical.is_empty() {
                victim
                    .outstanding_health_problems()
                    .into_iter()
                    .find_map(|problem| self.catalog.lookup(problem))
            } else {
                let procedure = critical
                    .iter()
                    .find_map(|problem| self.catalog.lookup(*problem));
                if procedure.is_none() {
                    let (discipline, number) = critical
                        .iter()
                        .next()
                        .map_or((0, 0), |problem| (problem.discipline, problem.number));
                    return Err(SimError::MissingProcedure { discipline, number });
                }
                procedure
            };

            match procedure {
                Some(procedure) => return self.assign_procedure(team_entity, specialist, target, procedure),
                None => match self.prepare_for_transport(target, team_entity) {
                    Ok(()) => continue,
                    Err(SimError::NoTeamWithoutQueue { victim }) => {
                        warn!(%victim, "no team without a queue, victim waits for transport");
                        break;
                    }
                    Err(err) => return Err(err),
                },
            }
        }

        let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
        if specialist + 1 == team.specialists.len() {
            team.try_return_to_vehicle();
        }
        Ok(())
    }

    fn assign_procedure(
        &mut self,
        team_entity: Entity,
        specialist: usize,
        target: Entity,
        procedure: Procedure,
    ) -> Result<(), SimError> {
        let mut team = self.teams.get_mut(team_entity).or_missing(team_entity)?;
        let mut victim = self.victims.get_mut(target).or_missing(target)?;
        debug!(
            team = %team.id,
            victim = %victim.id,
            problem = %procedure.health_problem,
            minutes = procedure.duration_minutes,
            "procedure assigned"
        );
        team.specialists[specialist].start_procedure(procedure, Some((target, &mut *victim)));
        Ok(())
    }

    /// Marks the victim transport-ready and queues the incident on the action
    /// team that could get there first.
    fn prepare_for_transport(&mut self, victim: Entity, team_entity: Entity) -> Result<(), SimError> {
        self.buckets.transfer(victim, Bucket::Assessed, Bucket::TransportReady);
        let here = self.teams.get(team_entity).or_missing(team_entity)?.origin.clone();
        let in_action = self.roster.in_action().to_vec();
        let Some(closest) = self.rank_teams(&in_action, &here)?.first().copied() else {
            return Err(SimError::NoTeamWithoutQueue {
                victim: self.victims.get(victim).or_missing(victim)?.id,
            });
        };
        let destination = self.incident_destination();
        let mut team = self.teams.get_mut(closest).or_missing(closest)?;
        debug!(team = %team.id, "incident queued for pickup");
        team.queue_target(destination);
        Ok(())
    }
}
