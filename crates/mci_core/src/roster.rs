//! Orchestrator-owned collections: victim status buckets, the idle / in-action
//! team partition, and hospitals ranked by distance from the incident.

use bevy_ecs::prelude::{Entity, Resource};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    /// Not yet triaged.
    Unknown,
    /// Triaged; being treated on scene, or dead.
    Assessed,
    /// Stabilised and waiting for an ambulance.
    TransportReady,
    /// In an ambulance on its way to a hospital.
    InTransport,
    Admitted,
}

/// Every victim sits in exactly one bucket.
#[derive(Debug, Default, Clone, Resource)]
pub struct VictimBuckets {
    all: Vec<Entity>,
    unknown: Vec<Entity>,
    assessed: Vec<Entity>,
    transport_ready: Vec<Entity>,
    in_transport: Vec<Entity>,
    admitted: Vec<Entity>,
}

impl VictimBuckets {
    /// All victims start with unknown status.
    pub fn new(victims: Vec<Entity>) -> Self {
        Self {
            unknown: victims.clone(),
            all: victims,
            ..Default::default()
        }
    }

    pub fn all(&self) -> &[Entity] {
        &self.all
    }

    pub fn get(&self, bucket: Bucket) -> &[Entity] {
        match bucket {
            Bucket::Unknown => &self.unknown,
            Bucket::Assessed => &self.assessed,
            Bucket::TransportReady => &self.transport_ready,
            Bucket::InTransport => &self.in_transport,
            Bucket::Admitted => &self.admitted,
        }
    }

    fn get_mut(&mut self, bucket: Bucket) -> &mut Vec<Entity> {
        match bucket {
            Bucket::Unknown => &mut self.unknown,
            Bucket::Assessed => &mut self.assessed,
            Bucket::TransportReady => &mut self.transport_ready,
            Bucket::InTransport => &mut self.in_transport,
            Bucket::Admitted => &mut self.admitted,
        }
    }

    pub fn bucket_of(&self, victim: Entity) -> Option<Bucket> {
        [
            Bucket::Unknown,
            Bucket::Assessed,
            Bucket::TransportReady,
            Bucket::InTransport,
            Bucket::Admitted,
        ]
        .into_iter()
        .find(|bucket| self.get(*bucket).contains(&victim))
    }

    /// Moves `victim` from `from` to `to`. A victim not in `from` is left
    /// where it is, so repeating a move is a no-op. Returns whether it moved.
    pub fn transfer(&mut self, victim: Entity, from: Bucket, to: Bucket) -> bool {
        let source = self.get_mut(from);
        let Some(index) = source.iter().position(|v| *v == victim) else {
            return false;
        };
        source.remove(index);
        let target = self.get_mut(to);
        if !target.contains(&victim) {
            target.push(victim);
        }
        true
    }

    pub fn is_empty(&self, bucket: Bucket) -> bool {
        self.get(bucket).is_empty()
    }
}

/// Idle teams and teams in action partition all teams.
#[derive(Debug, Default, Clone, Resource)]
pub struct TeamRoster {
    idle: Vec<Entity>,
    in_action: Vec<Entity>,
}

impl TeamRoster {
    pub fn new(teams: Vec<Entity>) -> Self {
        Self {
            idle: teams,
            in_action: Vec::new(),
        }
    }

    pub fn idle(&self) -> &[Entity] {
        &self.idle
    }

    pub fn in_action(&self) -> &[Entity] {
        &self.in_action
    }

    pub fn all(&self) -> impl Iterator<Item = Entity> + '_ {
        self.idle.iter().chain(self.in_action.iter()).copied()
    }

    /// No-op for teams already in action.
    pub fn team_into_action(&mut self, team: Entity) {
        if let Some(index) = self.idle.iter().position(|t| *t == team) {
            self.idle.remove(index);
            self.in_action.push(team);
        }
    }
}

/// Hospitals sorted by ascending travel time from the incident.
#[derive(Debug, Default, Clone, Resource)]
pub struct HospitalRanking(pub Vec<Entity>);
