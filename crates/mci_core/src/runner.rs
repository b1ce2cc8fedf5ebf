//! Simulation runner: builds the schedules and steps the world one simulated
//! minute at a time until every victim is settled.
//!
//! Systems cannot return errors. A system that hits a fatal condition stores it
//! in [SimulationFault]; the rest of the tick is skipped through `run_if` and
//! [run_tick] hands the error back to the caller.

use bevy_ecs::prelude::{Entity, Schedule, World};
use bevy_ecs::schedule::{ExecutorKind, IntoSystemConfigs};
use tracing::info;

use crate::clock::SimulationClock;
use crate::error::SimError;
use crate::roster::{Bucket, TeamRoster, VictimBuckets};
use crate::scenario::{build_scenario, no_fault, ReferenceData, Scenario, SimulationFault, SimulationParams};
use crate::systems::{
    bootstrap::initial_dispatch_system, clock_tick::clock_tick_system,
    deterioration::deterioration_system, movement::movement_system,
    orders::team_orders_system, procedures::procedure_progress_system,
    reconnaissance::reconnaissance_system,
};
use crate::team::{Team, TeamId};
use crate::telemetry::{SimulationResults, SolutionLog, SolutionRecord};
use crate::victim::Victim;

/// One simulated minute. The order is fixed: clock, movement and admission,
/// procedures, deterioration, reconnaissance, orders.
pub fn tick_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(
        (
            clock_tick_system.run_if(no_fault),
            movement_system.run_if(no_fault),
            procedure_progress_system.run_if(no_fault),
            deterioration_system.run_if(no_fault),
            reconnaissance_system.run_if(no_fault),
            team_orders_system.run_if(no_fault),
        )
            .chain(),
    );
    schedule
}

/// Sends the first wave of teams. Run once, before the first tick.
pub fn bootstrap_schedule() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.add_systems(initial_dispatch_system.run_if(no_fault));
    schedule
}

fn take_fault(world: &mut World) -> Result<(), SimError> {
    match world.resource_mut::<SimulationFault>().take() {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Runs the bootstrap schedule and surfaces any fault it raised.
pub fn run_bootstrap(world: &mut World, schedule: &mut Schedule) -> Result<(), SimError> {
    schedule.run(world);
    take_fault(world)
}

/// Runs one tick and surfaces any fault raised during it.
pub fn run_tick(world: &mut World, schedule: &mut Schedule) -> Result<(), SimError> {
    schedule.run(world);
    take_fault(world)
}

/// True once no victim is left unknown or waiting for transport, every
/// assessed victim is dead, and everyone is either admitted or assessed.
pub fn end_reached(world: &World) -> bool {
    let buckets = world.resource::<VictimBuckets>();
    let solution = world.resource::<SolutionLog>();
    if !buckets.is_empty(Bucket::Unknown) || !buckets.is_empty(Bucket::TransportReady) {
        return false;
    }
    let living_assessed = buckets
        .get(Bucket::Assessed)
        .iter()
        .filter_map(|&entity| world.get::<Victim>(entity))
        .any(|victim| !victim.is_dead());
    if living_assessed {
        return false;
    }
    buckets.get(Bucket::Assessed).len() + solution.len() == buckets.all().len()
}

fn round_to_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summary metrics of a finished run.
pub fn results(world: &World) -> Result<SimulationResults, SimError> {
    if !end_reached(world) {
        return Err(SimError::NotFinished);
    }
    let buckets = world.resource::<VictimBuckets>();
    let clock = world.resource::<SimulationClock>();

    let victims: Vec<&Victim> = buckets
        .all()
        .iter()
        .filter_map(|&entity| world.get::<Victim>(entity))
        .collect();
    let average_rpm = if victims.is_empty() {
        0.0
    } else {
        victims.iter().map(|victim| f64::from(victim.current_rpm())).sum::<f64>() / victims.len() as f64
    };
    let help_times: Vec<u32> = victims
        .iter()
        .filter_map(|victim| victim.hospital_admittance_time())
        .collect();
    let average_help_minutes = if help_times.is_empty() {
        0.0
    } else {
        help_times.iter().map(|&minutes| f64::from(minutes)).sum::<f64>() / help_times.len() as f64
    };

    Ok(SimulationResults {
        dead_count: buckets.get(Bucket::Assessed).len(),
        average_rpm: round_to_hundredths(average_rpm),
        total_minutes: clock.now(),
        average_help_minutes: round_to_hundredths(average_help_minutes),
    })
}

/// Bootstraps and ticks until [end_reached] or `max_ticks`.
/// Returns the number of ticks executed.
pub fn run_until_end(world: &mut World, max_ticks: u32) -> Result<u32, SimError> {
    run_until_end_with_hook(world, max_ticks, |_, _| {})
}

/// Like [run_until_end], invoking `hook` with the world and the minute after each tick.
pub fn run_until_end_with_hook<F>(world: &mut World, max_ticks: u32, mut hook: F) -> Result<u32, SimError>
where
    F: FnMut(&World, u32),
{
    run_bootstrap(world, &mut bootstrap_schedule())?;
    let mut schedule = tick_schedule();
    let mut ticks = 0;
    while !end_reached(world) {
        if ticks >= max_ticks {
            return Err(SimError::TickLimitExceeded { ticks });
        }
        run_tick(world, &mut schedule)?;
        ticks += 1;
        let now = world.resource::<SimulationClock>().now();
        hook(world, now);
    }
    info!(
        minutes = world.resource::<SimulationClock>().now(),
        admitted = world.resource::<SolutionLog>().len(),
        "simulation finished"
    );
    Ok(ticks)
}

/// A built scenario and the world that carries it.
pub struct Simulation {
    world: World,
}

impl Simulation {
    pub fn new(scenario: &Scenario, reference: &ReferenceData, params: SimulationParams) -> Result<Self, SimError> {
        let mut world = World::new();
        build_scenario(&mut world, scenario, reference, params)?;
        Ok(Self { world })
    }

    /// Wraps a world already populated by [build_scenario].
    pub fn from_world(world: World) -> Self {
        Self { world }
    }

    pub fn run(&mut self) -> Result<SimulationResults, SimError> {
        let max_ticks = self.world.resource::<SimulationParams>().max_ticks;
        run_until_end(&mut self.world, max_ticks)?;
        results(&self.world)
    }

    pub fn results(&self) -> Result<SimulationResults, SimError> {
        results(&self.world)
    }

    pub fn solution(&self) -> &[SolutionRecord] {
        self.world.resource::<SolutionLog>().records()
    }

    pub fn team_by_id(&self, id: &TeamId) -> Option<Entity> {
        self.world
            .resource::<TeamRoster>()
            .all()
            .find(|&entity| self.world.get::<Team>(entity).is_some_and(|team| &team.id == id))
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    pub fn into_world(self) -> World {
        self.world
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn averages_are_rounded_to_two_decimals() {
        assert_eq!(round_to_hundredths(10.0 / 3.0), 3.33);
        assert_eq!(round_to_hundredths(62.0 / 3.0), 20.67);
        assert_eq!(round_to_hundredths(0.0), 0.0);
    }
}
