use bevy_ecs::prelude::ResMut;

use crate::clock::SimulationClock;

pub fn clock_tick_system(mut clock: ResMut<SimulationClock>) {
    clock.tick();
}
