use bevy_ecs::prelude::ResMut;

use crate::error::SimError;
use crate::scenario::SimulationFault;
use crate::systems::incident_command::IncidentCommand;

/// Sends the first wave, one team per reported victim, and makes the fastest
/// of them the reconnaissance lead.
pub fn initial_dispatch_system(mut command: IncidentCommand, mut fault: ResMut<SimulationFault>) {
    let reported = command.incident.reported_victims_count;
    match command.dispatch_wave(reported) {
        Ok(Some(lead)) => command.lead.0 = Some(lead),
        Ok(None) => fault.raise(SimError::NoTeamsAvailable {
            location: command.incident.address.label.clone(),
        }),
        Err(error) => fault.raise(error),
    }
}
