#![allow(dead_code)]

use bevy_ecs::prelude::{Entity, World};
use mci_core::hospital::Hospital;
use mci_core::roster::{Bucket, TeamRoster, VictimBuckets};
use mci_core::team::Team;
use mci_core::victim::Victim;

pub fn team_entity(world: &World, id: &str) -> Entity {
    world
        .resource::<TeamRoster>()
        .all()
        .find(|&entity| world.get::<Team>(entity).is_some_and(|team| team.id.0 == id))
        .unwrap_or_else(|| panic!("team {id} in roster"))
}

pub fn team<'w>(world: &'w World, id: &str) -> &'w Team {
    world.get::<Team>(team_entity(world, id)).expect("team component")
}

pub fn victim(world: &World, entity: Entity) -> &Victim {
    world.get::<Victim>(entity).expect("victim component")
}

pub fn all_victims(world: &World) -> Vec<Entity> {
    world.resource::<VictimBuckets>().all().to_vec()
}

pub fn hospitals(world: &mut World) -> Vec<Hospital> {
    world.query::<&Hospital>().iter(world).cloned().collect()
}

/// Total beds (free plus occupied) per department id.
pub fn bed_totals(world: &mut World) -> Vec<(u32, u32)> {
    let mut totals: Vec<(u32, u32)> = hospitals(world)
        .iter()
        .flat_map(|hospital| hospital.departments.iter())
        .map(|department| {
            (
                department.id.0,
                department.current_beds_count + department.admitted_victims.len() as u32,
            )
        })
        .collect();
    totals.sort();
    totals
}

pub const ALL_BUCKETS: [Bucket; 5] = [
    Bucket::Unknown,
    Bucket::Assessed,
    Bucket::TransportReady,
    Bucket::InTransport,
    Bucket::Admitted,
];

/// Asserts every victim sits in exactly one bucket.
pub fn assert_bucket_partition(world: &World) {
    let buckets = world.resource::<VictimBuckets>();
    for &victim in buckets.all() {
        let memberships = ALL_BUCKETS
            .iter()
            .filter(|&&bucket| buckets.get(bucket).contains(&victim))
            .count();
        assert_eq!(memberships, 1, "victim {victim:?} is in {memberships} buckets");
    }
    let total: usize = ALL_BUCKETS.iter().map(|&bucket| buckets.get(bucket).len()).sum();
    assert_eq!(total, buckets.all().len());
}
