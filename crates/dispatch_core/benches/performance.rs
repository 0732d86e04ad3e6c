//! Performance benchmarks for dispatch_core using Criterion.rs.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use dispatch_core::agent::NearestVehicleAgent;
use dispatch_core::environment::RunOptions;
use dispatch_core::location::Location;
use dispatch_core::requests::Request;
use dispatch_core::test_helpers::{test_environment, test_request, test_vehicle};
use dispatch_core::travel_time::{HaversineService, TravelTimeMatrix};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn manhattan_point(rng: &mut StdRng) -> Location {
    Location::new(rng.gen_range(40.70..40.80), rng.gen_range(-74.02..-73.93))
}

fn requests(count: usize, rng: &mut StdRng) -> Vec<Request> {
    (0..count)
        .map(|i| {
            let origin = manhattan_point(rng);
            let destination = manhattan_point(rng);
            test_request(&format!("req_{:04}", i + 1), i as u64 * 20_000, origin, destination, 1)
        })
        .collect()
}

fn bench_simulation_run(c: &mut Criterion) {
    let scenarios = vec![("small", 20, 100), ("medium", 100, 500), ("large", 300, 2000)];

    let mut group = c.benchmark_group("simulation_run");
    for (name, vehicles, count) in scenarios {
        group.bench_with_input(
            BenchmarkId::from_parameter(name),
            &(vehicles, count),
            |b, &(vehicles, count)| {
                let mut rng = StdRng::seed_from_u64(42);
                let fleet: Vec<_> = (0..vehicles)
                    .map(|i| {
                        let p = manhattan_point(&mut rng);
                        test_vehicle(i as u32 + 1, p.latitude, p.longitude)
                    })
                    .collect();
                let requests = requests(count, &mut rng);
                b.iter(|| {
                    let mut env = test_environment(fleet.clone());
                    let mut agent = NearestVehicleAgent::oracle();
                    black_box(env.run(&requests, &mut agent, &RunOptions::default()))
                });
            },
        );
    }
    group.finish();
}

fn bench_advance_to(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(7);
    let fleet: Vec<_> = (0..200)
        .map(|i| {
            let p = manhattan_point(&mut rng);
            test_vehicle(i + 1, p.latitude, p.longitude)
        })
        .collect();
    let requests = requests(200, &mut rng);

    c.bench_function("advance_to_drain", |b| {
        b.iter_batched(
            || {
                // Assign everything at t=0 so the queue holds a full fleet's worth of events.
                let mut env = test_environment(fleet.clone());
                let mut agent = NearestVehicleAgent::oracle();
                for (i, request) in requests.iter().enumerate() {
                    env.process_request(i, request, &mut agent);
                }
                env
            },
            |mut env| black_box(env.advance_to(24 * 3600 * 1000)),
            criterion::BatchSize::SmallInput,
        );
    });
}

fn bench_matrix_build(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(11);
    let mut group = c.benchmark_group("travel_time_matrix");
    for count in [50usize, 200] {
        let legs: Vec<_> = requests(count, &mut rng).iter().map(Request::leg).collect();
        let service = HaversineService::default();
        group.bench_with_input(BenchmarkId::from_parameter(count), &legs, |b, legs| {
            b.iter(|| black_box(TravelTimeMatrix::build(legs, &service)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_simulation_run, bench_advance_to, bench_matrix_build);
criterion_main!(benches);
