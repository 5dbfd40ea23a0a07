// Copyright 2025 John Brosnihan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//! Benchmarks for the force pass and full steps across backends
//!
//! These benchmarks measure:
//! - Force pass throughput for each backend as N grows
//! - Independent-row versus symmetric-pair accumulation on one thread
//! - Full force + integration steps, including device transfers for the grid

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use nbody_engine::backend::{BackendConfig, ExecutionBackend, SequentialBackend};
use nbody_engine::config::SimulationConfig;
use nbody_engine::gravity::{ForceKernel, ForceStrategy};
use nbody_engine::particles::{ParticleSystem, RandomInit};
use nbody_engine::simulation::run_steps;
use nbody_engine::snapshot::SnapshotEmitter;

const SIZES: &[usize] = &[64, 256, 1024];

fn system(count: usize) -> ParticleSystem {
    ParticleSystem::random_init(count, &RandomInit::with_seed(42)).expect("valid random init")
}

fn backends() -> Vec<(&'static str, nbody_engine::Backend)> {
    [
        ("sequential", BackendConfig::Sequential),
        ("threaded", BackendConfig::default()),
        ("grid", BackendConfig::Grid { group_size: 256 }),
    ]
    .into_iter()
    .map(|(name, config)| (name, config.build().expect("valid backend")))
    .collect()
}

fn bench_force_pass(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_pass");
    let kernel = ForceKernel::new(6.67430e-11, 1e18).expect("valid kernel");

    for &count in SIZES {
        // Pair interactions per pass
        group.throughput(Throughput::Elements((count * count) as u64));
        for (name, backend) in backends() {
            let mut particles = system(count);
            group.bench_with_input(BenchmarkId::new(name, count), &count, |b, _| {
                b.iter(|| {
                    kernel.compute_forces(&mut particles, &backend);
                    black_box(particles.forces());
                });
            });
        }
    }

    group.finish();
}

fn bench_force_strategy(c: &mut Criterion) {
    let mut group = c.benchmark_group("force_strategy");

    for &count in SIZES {
        group.throughput(Throughput::Elements((count * count) as u64));
        for strategy in [ForceStrategy::IndependentRows, ForceStrategy::SymmetricPairs] {
            let kernel = ForceKernel::new(6.67430e-11, 1e18)
                .expect("valid kernel")
                .with_strategy(strategy);
            let mut particles = system(count);
            group.bench_with_input(BenchmarkId::new(format!("{strategy:?}"), count), &count, |b, _| {
                b.iter(|| {
                    kernel.compute_forces(&mut particles, &SequentialBackend);
                    black_box(particles.forces());
                });
            });
        }
    }

    group.finish();
}

fn bench_full_steps(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_steps");
    let config = SimulationConfig::new(3600.0, 10, 10, 1e18);

    for (name, backend) in backends() {
        group.bench_with_input(BenchmarkId::new(name, 256), &256, |b, &count| {
            b.iter_batched(
                || system(count),
                |mut particles| {
                    let mut emitter = SnapshotEmitter::new(std::io::sink());
                    let summary = run_steps(&mut particles, &config, &backend, &mut emitter)
                        .expect("benchmark run");
                    black_box(summary.steps_completed);
                    black_box(backend.name());
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_force_pass, bench_force_strategy, bench_full_steps);
criterion_main!(benches);
