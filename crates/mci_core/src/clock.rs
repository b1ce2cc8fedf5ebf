use bevy_ecs::prelude::Resource;

/// Simulated minutes since the incident was reported. One tick is one minute.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Resource)]
pub struct SimulationClock {
    now: u32,
}

impl SimulationClock {
    pub fn now(&self) -> u32 {
        self.now
    }

    pub fn tick(&mut self) -> u32 {
        self.now += 1;
        self.now
    }
}
