//! Benchmarks for the gridlife simulator.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use gridlife::{
    compute::{NeuralNet, Simulator, network_shape},
    compute::evolution::GenomeRng,
    schema::{Challenge, SimulationConfig},
};

fn bench_simulator_step(c: &mut Criterion) {
    let mut group = c.benchmark_group("simulator_step");

    for (size, population) in [(64u16, 500usize), (128, 3000), (256, 10000)] {
        let config = SimulationConfig {
            width: size,
            height: size,
            population,
            steps_per_generation: u32::MAX,
            challenge: Challenge::None,
            random_seed: Some(42),
            ..Default::default()
        };

        let mut sim = Simulator::new(config).expect("benchmark configuration is valid");

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}_{}", size, size, population)),
            &population,
            |b, _| {
                b.iter(|| {
                    sim.step_once();
                    black_box(sim.step());
                });
            },
        );
    }

    group.finish();
}

fn bench_genome_compile(c: &mut Criterion) {
    let mut group = c.benchmark_group("genome_compile");
    let config = SimulationConfig::default();
    let shape = network_shape(&config);

    for length in [24usize, 100, 300] {
        let mut genome_config = config.genome.clone();
        genome_config.initial_length_min = length;
        genome_config.initial_length_max = length;
        genome_config.max_length = length;
        let genome = GenomeRng::new(7).random_genome(&genome_config);

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_genes", length)),
            &length,
            |b, _| {
                b.iter(|| NeuralNet::compile(black_box(&genome), shape));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_simulator_step, bench_genome_compile);
criterion_main!(benches);
