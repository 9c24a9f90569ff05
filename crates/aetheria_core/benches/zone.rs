//! Zone benchmarks for aetheria_core.
//!
//! Run with: `cargo bench -p aetheria_core`

// Benchmark binaries don't need docs on macro-generated functions
#![allow(missing_docs)]

use aetheria_core::generation::generate_zone;
use aetheria_test_utils::fixtures;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};

/// Ticks a six-ship skirmish and generates zone layouts.
pub fn zone_benchmark(c: &mut Criterion) {
    let ctx = fixtures::context();

    c.bench_function("skirmish_tick", |b| {
        b.iter_batched(
            || fixtures::skirmish(&ctx),
            |mut zone| black_box(zone.update(&ctx, 0.1)),
            BatchSize::SmallInput,
        )
    });

    c.bench_function("skirmish_100_ticks", |b| {
        b.iter_batched(
            || fixtures::skirmish(&ctx),
            |mut zone| {
                for _ in 0..100 {
                    zone.update(&ctx, 0.1);
                }
                black_box(zone.state_hash())
            },
            BatchSize::SmallInput,
        )
    });

    let sector = fixtures::sector();
    let settings = &ctx.zone_settings;
    c.bench_function("generate_zone", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed += 1;
            black_box(generate_zone(seed, settings, &ctx.global, &sector, &settings.resources))
        })
    });
}

criterion_group!(benches, zone_benchmark);
criterion_main!(benches);
