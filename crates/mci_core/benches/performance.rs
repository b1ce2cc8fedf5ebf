//! Performance benchmarks for mci_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use mci_core::routing::{DistanceProvider, StraightLineProvider, TableDistanceProvider};
use mci_core::runner::Simulation;
use mci_core::scenario::ProfileCount;
use mci_core::team::TeamId;
use mci_core::test_helpers::{
    build_world_with, fixture_params, fixture_scenario, hospital_address, incident_address,
    INCIDENT, TEAM_OLKUSZ,
};

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("fixture", 2, 2), ("medium", 10, 10), ("large", 40, 40)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, abdominal, pelvic) in scenarios {
        let mut scenario = fixture_scenario();
        scenario.teams.push(TeamId::new(TEAM_OLKUSZ));
        scenario.victims = vec![
            ProfileCount {
                profile: "abdominal".to_string(),
                count: abdominal,
            },
            ProfileCount {
                profile: "pelvic".to_string(),
                count: pelvic,
            },
        ];
        scenario.total_victims = abdominal + pelvic;
        scenario.departments[0].beds = scenario.total_victims as u32;

        group.bench_with_input(BenchmarkId::from_parameter(name), &scenario, |b, scenario| {
            b.iter(|| {
                let world = build_world_with(scenario, fixture_params().with_seed(42)).expect("scenario");
                let mut simulation = Simulation::from_world(world);
                black_box(simulation.run().expect("run ends"))
            });
        });
    }
    group.finish();
}

fn bench_distance_providers(c: &mut Criterion) {
    let from = incident_address();
    let to = hospital_address();
    let straight = StraightLineProvider::default();
    let table = TableDistanceProvider::new().with_leg(INCIDENT, &to.label, 8.7, 15.0);

    let mut group = c.benchmark_group("distance_providers");
    group.bench_function("straight_line", |b| {
        b.iter(|| black_box(straight.distance_and_duration(&from, &to)))
    });
    group.bench_function("table", |b| {
        b.iter(|| black_box(table.distance_and_duration(&from, &to)))
    });
    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_distance_providers);
criterion_main!(benches);
