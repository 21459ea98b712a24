use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use spatial_seir::contact::{find_contacts_all_pairs, find_contacts_grid};
use spatial_seir::{Compartment, Simulation, SimulationParametersBuilder};

static SEED: u64 = 123;
static RADIUS: f64 = 10.0;
static WARMUP_TICKS: u64 = 100;

/// A mid-outbreak population so both Susceptible and Infected agents are present.
fn population(size: usize) -> Vec<spatial_seir::Agent> {
    let parameters = SimulationParametersBuilder::default()
        .population(size)
        .initial_infected(size / 10)
        .infection_radius(RADIUS)
        .build()
        .expect("failed to build parameters");
    let mut simulation = Simulation::new(parameters, SEED).expect("failed to build simulation");
    simulation
        .run(WARMUP_TICKS)
        .expect("failed to warm up simulation");
    simulation.agents().to_vec()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("contact detection");
    for size in [250, 1000, 4000] {
        let agents = population(size);
        let infected = agents
            .iter()
            .filter(|a| a.compartment == Compartment::Infected)
            .count();
        println!("population {size}: {infected} infected");

        group.bench_with_input(BenchmarkId::new("all pairs", size), &agents, |b, agents| {
            b.iter(|| find_contacts_all_pairs(black_box(agents), RADIUS));
        });
        group.bench_with_input(BenchmarkId::new("grid", size), &agents, |b, agents| {
            b.iter(|| find_contacts_grid(black_box(agents), RADIUS));
        });
    }
    group.finish();

    c.bench_function("simulation step 1000", |bencher| {
        bencher.iter_with_large_drop(|| {
            let parameters = SimulationParametersBuilder::default()
                .population(1000)
                .build()
                .expect("failed to build parameters");
            let mut simulation =
                Simulation::new(parameters, SEED).expect("failed to build simulation");
            simulation.run(50).expect("run failed");
            simulation
        });
    });
}

criterion_group!(contact_benches, criterion_benchmark);
criterion_main!(contact_benches);
