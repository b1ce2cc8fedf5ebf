use bevy_ecs::prelude::{Query, Res, ResMut};

use crate::clock::SimulationClock;
use crate::deterioration::DeteriorationTable;
use crate::error::SimError;
use crate::roster::VictimBuckets;
use crate::scenario::SimulationFault;
use crate::victim::Victim;

/// Applies RPM decay and timed state changes to every victim, in victim order.
pub fn deterioration_system(
    clock: Res<SimulationClock>,
    table: Res<DeteriorationTable>,
    buckets: Res<VictimBuckets>,
    mut victims: Query<&mut Victim>,
    mut fault: ResMut<SimulationFault>,
) {
    let now = clock.now();
    for &entity in buckets.all() {
        let result = match victims.get_mut(entity) {
            Ok(mut victim) => victim.lower_rpm(now, &table),
            Err(_) => Err(SimError::MissingEntity(entity)),
        };
        if let Err(error) = result {
            fault.raise(error);
            return;
        }
    }
}
