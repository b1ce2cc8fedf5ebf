use bevy_ecs::prelude::ResMut;

use crate::scenario::SimulationFault;
use crate::systems::incident_command::IncidentCommand;

pub fn reconnaissance_system(mut command: IncidentCommand, mut fault: ResMut<SimulationFault>) {
    if let Err(error) = command.reconnaissance() {
        fault.raise(error);
    }
}
