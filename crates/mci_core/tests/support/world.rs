#![allow(dead_code)]

use bevy_ecs::prelude::World;
use mci_core::scenario::{Scenario, SimulationParams};
use mci_core::team::TeamId;
use mci_core::test_helpers::{build_world_with, fixture_params, fixture_scenario, TEAM_OLKUSZ};

/// Builder for reproducible fixture worlds.
#[derive(Clone, Debug)]
pub struct TestWorldBuilder {
    scenario: Scenario,
    params: SimulationParams,
}

impl Default for TestWorldBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorldBuilder {
    pub fn new() -> Self {
        Self {
            scenario: fixture_scenario(),
            params: fixture_params(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.params = self.params.with_seed(seed);
        self
    }

    pub fn with_max_ticks(mut self, max_ticks: u32) -> Self {
        self.params = self.params.with_max_ticks(max_ticks);
        self
    }

    /// Adds the slow third team from Olkusz.
    pub fn with_third_team(mut self) -> Self {
        self.scenario.teams.push(TeamId::new(TEAM_OLKUSZ));
        self
    }

    pub fn with_scenario(mut self, edit: impl FnOnce(&mut Scenario)) -> Self {
        edit(&mut self.scenario);
        self
    }

    pub fn scenario(&self) -> &Scenario {
        &self.scenario
    }

    pub fn build(self) -> World {
        build_world_with(&self.scenario, self.params).expect("fixture scenario builds")
    }
}
