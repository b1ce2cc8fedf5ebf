//! Per-team decisions for every team in action: where to drive next, whom to
//! transport, and what its specialists do once they are free.

use bevy_ecs::prelude::ResMut;

use crate::scenario::SimulationFault;
use crate::systems::incident_command::IncidentCommand;

pub fn team_orders_system(mut command: IncidentCommand, mut fault: ResMut<SimulationFault>) {
    let teams = command.roster.in_action().to_vec();
    for team in teams {
        if let Err(error) = command.order_team(team) {
            fault.raise(error);
            return;
        }
    }
}
