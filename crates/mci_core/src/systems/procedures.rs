use bevy_ecs::prelude::ResMut;

use crate::scenario::SimulationFault;
use crate::systems::incident_command::IncidentCommand;

/// Counts down every specialist's procedure and applies the finished ones.
pub fn procedure_progress_system(mut command: IncidentCommand, mut fault: ResMut<SimulationFault>) {
    let teams = command.roster.in_action().to_vec();
    for team in teams {
        if let Err(error) = command.progress_procedures(team) {
            fault.raise(error);
            return;
        }
    }
}
