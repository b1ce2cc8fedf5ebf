use bevy_ecs::prelude::{Entity, Res, Resource};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::routing::DistanceProviderKind;
use crate::team::EMERGENCY_SPEED_FACTOR;

/// Safety bound on simulated minutes; a scenario whose victims can never all
/// be settled (e.g. no department for some discipline) stops here.
pub const DEFAULT_MAX_TICKS: u32 = 10_000;

/// Share of the true victim count the first call reports, drawn uniformly.
pub const DEFAULT_REPORTED_FRACTION_MIN: f64 = 0.30;
pub const DEFAULT_REPORTED_FRACTION_MAX: f64 = 0.75;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Resource)]
#[serde(default)]
pub struct SimulationParams {
    /// Seed for the victim shuffle, the reported count and triage order. `None` = entropy.
    pub seed: Option<u64>,
    pub max_ticks: u32,
    pub reported_fraction_min: f64,
    pub reported_fraction_max: f64,
    pub emergency_speed_factor: f64,
    pub distance_provider: DistanceProviderKind,
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: None,
            max_ticks: DEFAULT_MAX_TICKS,
            reported_fraction_min: DEFAULT_REPORTED_FRACTION_MIN,
            reported_fraction_max: DEFAULT_REPORTED_FRACTION_MAX,
            emergency_speed_factor: EMERGENCY_SPEED_FACTOR,
            distance_provider: DistanceProviderKind::default(),
        }
    }
}

impl SimulationParams {
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    pub fn with_reported_fraction(mut self, min: f64, max: f64) -> Self {
        self.reported_fraction_min = min.min(max);
        self.reported_fraction_max = max.max(min);
        self
    }

    pub fn with_emergency_speed_factor(mut self, factor: f64) -> Self {
        self.emergency_speed_factor = factor;
        self
    }

    pub fn with_distance_provider(mut self, kind: DistanceProviderKind) -> Self {
        self.distance_provider = kind;
        self
    }
}

/// The simulation's single random source.
#[derive(Debug, Clone, Resource)]
pub struct SimRng(pub StdRng);

impl SimRng {
    pub fn new(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self(StdRng::seed_from_u64(seed)),
            None => Self(StdRng::from_entropy()),
        }
    }
}

/// The first team dispatched; it performs reconnaissance on arrival.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Resource)]
pub struct ReconnaissanceLead(pub Option<Entity>);

/// First fatal error raised by a system during the current run. Systems after
/// the one that raised it are skipped and the runner returns it.
#[derive(Debug, Default, Resource)]
pub struct SimulationFault(Option<SimError>);

impl SimulationFault {
    /// Keeps the first error; later ones are consequences of it.
    pub fn raise(&mut self, error: SimError) {
        if self.0.is_none() {
            tracing::error!(%error, "simulation fault");
            self.0 = Some(error);
        }
    }

    pub fn is_raised(&self) -> bool {
        self.0.is_some()
    }

    pub fn take(&mut self) -> Option<SimError> {
        self.0.take()
    }
}

/// Run condition: skip systems once a fault has been raised.
pub fn no_fault(fault: Res<SimulationFault>) -> bool {
    !fault.is_raised()
}
