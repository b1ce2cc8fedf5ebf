//! Movement system: advances every team in action by one minute of travel and
//! hands passengers over to the hospital they arrive at.

use bevy_ecs::prelude::ResMut;

use crate::scenario::SimulationFault;
use crate::systems::incident_command::IncidentCommand;

pub fn movement_system(mut command: IncidentCommand, mut fault: ResMut<SimulationFault>) {
    let teams = command.roster.in_action().to_vec();
    for team in teams {
        if let Err(error) = command.advance_team(team) {
            fault.raise(error);
            return;
        }
    }
}
