//! # Genesis Benchmarks
//!
//! | Stage | Measured |
//! |-------|----------|
//! | Builder | Fake genesis construction and execution per validator count |
//! | State | State root over the built store |
//! | Export | Sequential vs parallel export, in-memory vs spilled |

use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use qc_genesis_builder::FakeGenesisParams;
use qc_genesis_store::{export_genesis, ExportConfig, ExportMode};
use qc_tests::fixtures::{build_with, seeded_genesis, validators_from_seed, DEFAULT_SEED};

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("genesis-build");
    group.measurement_time(Duration::from_secs(10));

    for count in [3usize, 30, 300] {
        let (_, validators) = validators_from_seed(count, DEFAULT_SEED);
        let params = FakeGenesisParams::default();
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::new("build_fake_genesis", count), &count, |b, _| {
            b.iter(|| black_box(build_with(&validators, &params).current_hash()))
        });
    }
    group.finish();
}

fn bench_state_root(c: &mut Criterion) {
    let genesis = seeded_genesis(300, DEFAULT_SEED);
    c.bench_function("state_root_300_validators", |b| {
        b.iter(|| black_box(genesis.state().root_hash().ok()))
    });
}

fn bench_export(c: &mut Criterion) {
    let mut group = c.benchmark_group("genesis-export");
    let genesis = seeded_genesis(300, DEFAULT_SEED);
    let dir = tempfile::tempdir().expect("bench tempdir");
    let output = dir.path().join("genesis.g");

    let configs = [
        ("sequential", ExportConfig::default()),
        ("parallel", ExportConfig::default().with_mode(ExportMode::Parallel)),
        ("sequential_spilled", ExportConfig::default().with_spill_threshold(4 * 1024)),
        (
            "parallel_spilled",
            ExportConfig::default()
                .with_mode(ExportMode::Parallel)
                .with_spill_threshold(4 * 1024),
        ),
    ];
    for (name, config) in configs {
        group.bench_function(name, |b| {
            b.iter(|| black_box(export_genesis(&genesis, &output, &config).is_ok()))
        });
    }
    group.finish();
}

criterion_group!(benches, bench_build, bench_state_root, bench_export);
criterion_main!(benches);
