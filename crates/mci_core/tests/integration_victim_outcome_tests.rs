mod support;

use bevy_ecs::prelude::{Entity, World};
use mci_core::hospital::DepartmentId;
use mci_core::roster::{Bucket, TeamRoster, VictimBuckets};
use mci_core::runner::results;
use mci_core::scenario::ProfileCount;
use mci_core::team::{Destination, Team};
use mci_core::telemetry::SolutionLog;
use mci_core::test_helpers::TEAM_CITY;
use mci_core::victim::Victim;
use support::entities::{all_victims, assert_bucket_partition, bed_totals, hospitals, team, victim};
use support::schedule::ScheduleRunner;
use support::world::TestWorldBuilder;

const FIXTURE_RUN_SEED: u64 = 5;

fn world_with_victims(seed: u64, victims: &[(&str, usize)]) -> World {
    TestWorldBuilder::new()
        .with_seed(seed)
        .with_scenario(|scenario| {
            scenario.victims = victims
                .iter()
                .map(|&(profile, count)| ProfileCount {
                    profile: profile.to_string(),
                    count,
                })
                .collect();
            scenario.total_victims = victims.iter().map(|&(_, count)| count).sum();
        })
        .build()
}

fn only_victim(world: &World) -> Entity {
    let victims = all_victims(world);
    assert_eq!(victims.len(), 1);
    victims[0]
}

fn bucket_of(world: &World, entity: Entity) -> Option<Bucket> {
    world.resource::<VictimBuckets>().bucket_of(entity)
}

fn any_team_queued_for_incident(world: &World) -> bool {
    world
        .resource::<TeamRoster>()
        .all()
        .filter_map(|entity| world.get::<Team>(entity))
        .any(|team| team.queue().any(Destination::is_incident))
}

fn assert_no_reservations(world: &mut World) {
    for hospital in hospitals(world) {
        for department in &hospital.departments {
            assert!(
                hospital.incoming(department.id).is_empty(),
                "department {} still holds a reservation",
                department.id
            );
        }
    }
}

#[test]
fn treated_victims_improve_and_the_unreachable_one_dies() {
    for seed in [3, 7, 19] {
        let mut world = world_with_victims(seed, &[("crush_injury", 2), ("cardiac_arrest", 1)]);
        let beds_before = bed_totals(&mut world);
        let mut runner = ScheduleRunner::new();
        runner.bootstrap(&mut world).expect("bootstrap");

        let mut incident_queued = false;
        runner.run_checked(&mut world, 2_000, |world| {
            assert_bucket_partition(world);
            assert_eq!(bed_totals(world), beds_before);
            incident_queued |= any_team_queued_for_incident(world);
        });
        assert!(incident_queued, "seed {seed}: no team was queued for a pickup");

        let summary = results(&world).expect("finished");
        let admitted = world.resource::<SolutionLog>().len();
        assert_eq!(summary.dead_count, 1);
        assert_eq!(summary.dead_count + admitted, 3);

        for entity in all_victims(&world) {
            let patient = victim(&world, entity);
            let treatable = patient
                .states()
                .iter()
                .any(|state| state.intervention_transition.is_some());
            if treatable {
                assert!(patient.is_admitted());
                assert_eq!(patient.current_state().number, 2);
            } else {
                assert!(patient.is_dead());
                assert_eq!(bucket_of(&world, entity), Some(Bucket::Assessed));
            }
        }
        for record in world.resource::<SolutionLog>().records() {
            assert_eq!(record.hospital_department, "1-1");
        }
        assert_no_reservations(&mut world);
    }
}

#[test]
fn death_in_transport_releases_the_reserved_bed() {
    let mut world = world_with_victims(FIXTURE_RUN_SEED, &[("internal_bleeding", 1)]);
    let patient = only_victim(&world);
    let beds_before = bed_totals(&mut world);
    let mut runner = ScheduleRunner::new();
    runner.bootstrap(&mut world).expect("bootstrap");

    let mut carried = false;
    runner.run_checked(&mut world, 200, |world| {
        if bucket_of(world, patient) == Some(Bucket::InTransport) {
            carried = true;
            assert!(hospitals(world)
                .iter()
                .any(|hospital| !hospital.incoming(DepartmentId(1)).is_empty()));
        }
    });
    assert!(carried);

    assert!(victim(&world, patient).is_dead());
    assert!(!victim(&world, patient).is_admitted());
    assert_eq!(bucket_of(&world, patient), Some(Bucket::Assessed));
    assert!(world.resource::<SolutionLog>().is_empty());
    assert_eq!(results(&world).expect("finished").dead_count, 1);
    assert_no_reservations(&mut world);
    assert_eq!(bed_totals(&mut world), beds_before);
}

#[test]
fn victim_dying_while_waiting_for_transport_is_filed_as_dead() {
    let mut world = world_with_victims(FIXTURE_RUN_SEED, &[("internal_bleeding", 1)]);
    let patient = only_victim(&world);
    let mut runner = ScheduleRunner::new();
    runner.bootstrap(&mut world).expect("bootstrap");

    let mut waited = false;
    let mut carried = false;
    runner.run_checked(&mut world, 200, |world| {
        match bucket_of(world, patient) {
            Some(Bucket::TransportReady) if !waited => {
                waited = true;
                let mut dying = world.get_mut::<Victim>(patient).expect("victim component");
                dying.change_state(2).expect("black state");
            }
            Some(Bucket::InTransport) => carried = true,
            _ => {}
        }
    });
    assert!(waited);
    assert!(!carried, "a dead victim was loaded");

    assert_eq!(bucket_of(&world, patient), Some(Bucket::Assessed));
    assert!(world.resource::<SolutionLog>().is_empty());
    assert_eq!(results(&world).expect("finished").dead_count, 1);
    assert_no_reservations(&mut world);
}

#[test]
fn victim_waits_when_no_team_can_be_queued_and_is_still_admitted() {
    let mut world = world_with_victims(FIXTURE_RUN_SEED, &[("pelvic", 1)]);
    let patient = only_victim(&world);
    let mut runner = ScheduleRunner::new();
    runner.bootstrap(&mut world).expect("bootstrap");

    let mut waited_unqueued = false;
    runner.run_checked(&mut world, 200, |world| {
        if bucket_of(world, patient) == Some(Bucket::TransportReady) && !waited_unqueued {
            // The only team in action has its crew outside, so nobody could be queued.
            assert_eq!(world.resource::<TeamRoster>().in_action().len(), 1);
            let city = team(world, TEAM_CITY);
            assert!(city.are_specialists_outside());
            assert!(!city.has_queue());
            waited_unqueued = true;
        }
    });
    assert!(waited_unqueued);

    let solution = world.resource::<SolutionLog>().records().to_vec();
    assert_eq!(solution.len(), 1);
    assert_eq!(solution[0].sequence, 1);
    assert_eq!(solution[0].team_id.0, TEAM_CITY);
    assert_eq!(solution[0].hospital_department, "1-1");
    assert!(victim(&world, patient).is_admitted());
    assert_eq!(results(&world).expect("finished").dead_count, 0);
}
