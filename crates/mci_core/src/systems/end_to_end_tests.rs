use bevy_ecs::prelude::{Schedule, World};

use crate::clock::SimulationClock;
use crate::deterioration::DeteriorationTable;
use crate::error::SimError;
use crate::roster::{Bucket, TeamRoster, VictimBuckets};
use crate::runner::{bootstrap_schedule, run_bootstrap, run_tick, tick_schedule};
use crate::scenario::SimulationFault;
use crate::systems::deterioration::deterioration_system;
use crate::team::Team;
use crate::test_helpers::create_test_world;
use crate::victim::Victim;

fn world() -> World {
    create_test_world().expect("fixture world")
}

#[test]
fn deterioration_applies_the_table_on_the_interval() {
    let mut world = world();
    for _ in 0..30 {
        world.resource_mut::<SimulationClock>().tick();
    }
    let mut schedule = Schedule::default();
    schedule.add_systems(deterioration_system);
    schedule.run(&mut world);

    let table = DeteriorationTable::default();
    let victims = world.resource::<VictimBuckets>().all().to_vec();
    for entity in victims {
        let victim = world.get::<Victim>(entity).expect("victim");
        assert_eq!(victim.current_rpm(), table.lookup(victim.initial_rpm(), 0));
    }
}

#[test]
fn raised_fault_skips_the_tick_and_surfaces() {
    let mut world = world();
    world
        .resource_mut::<SimulationFault>()
        .raise(SimError::NotFinished);

    let err = run_tick(&mut world, &mut tick_schedule()).expect_err("fault surfaces");
    assert!(matches!(err, SimError::NotFinished));
    assert_eq!(world.resource::<SimulationClock>().now(), 0);

    run_tick(&mut world, &mut tick_schedule()).expect("fault was taken");
    assert_eq!(world.resource::<SimulationClock>().now(), 1);
}

#[test]
fn first_team_on_scene_triages_after_reconnaissance() {
    let mut world = world();
    run_bootstrap(&mut world, &mut bootstrap_schedule()).expect("bootstrap");
    let mut schedule = tick_schedule();
    // Six minutes to the scene, then five of reconnaissance; triage starts
    // in the minute reconnaissance ends.
    for _ in 0..10 {
        run_tick(&mut world, &mut schedule).expect("tick");
        assert_eq!(world.resource::<VictimBuckets>().get(Bucket::Assessed).len(), 0);
    }
    run_tick(&mut world, &mut schedule).expect("tick");

    let lead = world.resource::<TeamRoster>().in_action()[0];
    let team = world.get::<Team>(lead).expect("team");
    assert!(team.are_specialists_outside());
    assert_eq!(
        world.resource::<VictimBuckets>().get(Bucket::Assessed).len(),
        team.specialists.len()
    );
}
