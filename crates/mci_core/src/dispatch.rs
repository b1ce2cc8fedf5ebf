//! Ordering rules used by the orchestrator: which team gets there first and
//! which victim is worst off.

use bevy_ecs::prelude::Entity;

use crate::error::SimError;
use crate::routing::{Address, DistanceProvider};
use crate::team::Team;
use crate::victim::{Victim, VictimId};

/// Teams free to take a new destination (no queue, crew aboard), sorted by
/// projected arrival at `address`. Ties keep the input order.
pub fn rank_by_arrival<'a, I>(
    teams: I,
    address: &Address,
    provider: &dyn DistanceProvider,
) -> Result<Vec<(Entity, f64)>, SimError>
where
    I: IntoIterator<Item = (Entity, &'a Team)>,
{
    let mut ranked = Vec::new();
    for (entity, team) in teams {
        if team.has_queue() || team.are_specialists_outside() {
            continue;
        }
        ranked.push((entity, team.projected_minutes_to(address, provider)?));
    }
    ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
    Ok(ranked)
}

/// Red before yellow before green, then lowest RPM, then lowest id.
pub fn priority_key(victim: &Victim) -> (u8, u32, VictimId) {
    (
        victim.triage_colour().urgency_rank(),
        victim.current_rpm(),
        victim.id,
    )
}
