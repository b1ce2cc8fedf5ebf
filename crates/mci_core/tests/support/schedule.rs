#![allow(dead_code)]

use bevy_ecs::prelude::World;
use bevy_ecs::schedule::Schedule;
use mci_core::error::SimError;
use mci_core::runner::{bootstrap_schedule, end_reached, run_bootstrap, run_tick, tick_schedule};

/// Owns the tick schedule so tests can step a world minute by minute.
pub struct ScheduleRunner {
    schedule: Schedule,
}

impl Default for ScheduleRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl ScheduleRunner {
    pub fn new() -> Self {
        Self {
            schedule: tick_schedule(),
        }
    }

    pub fn bootstrap(&mut self, world: &mut World) -> Result<(), SimError> {
        run_bootstrap(world, &mut bootstrap_schedule())
    }

    pub fn tick(&mut self, world: &mut World) -> Result<(), SimError> {
        run_tick(world, &mut self.schedule)
    }

    /// Ticks until the run ends, calling `check` after every tick.
    pub fn run_checked<F>(&mut self, world: &mut World, max_ticks: u32, mut check: F) -> u32
    where
        F: FnMut(&mut World),
    {
        let mut ticks = 0;
        while !end_reached(world) {
            assert!(ticks < max_ticks, "run did not end within {max_ticks} ticks");
            self.tick(world).expect("tick succeeds");
            ticks += 1;
            check(world);
        }
        ticks
    }
}
