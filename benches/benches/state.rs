// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `coffer_state` watcher fan-out and `coffer_pipeline` walks.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use coffer_pipeline::{Phase, Pipeline};
use coffer_state::StateStore;

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("state/fan_out");

    for &watchers in &[16_u32, 256, 4096] {
        let mut store = StateStore::<u32>::new();
        let coins = store.create("coins", 0_u64);
        for w in 0..watchers {
            store.watch(coins.id(), w);
        }

        group.bench_function(BenchmarkId::new("set_and_take", watchers), |b| {
            b.iter(|| {
                store.update(coins, |c| *c += 1);
                black_box(store.take_pending().len())
            });
        });
    }

    // Many writes to overlapping states must still schedule each watcher once.
    group.bench_function("overlapping_writes", |b| {
        b.iter_batched(
            || {
                let mut store = StateStore::<u32>::new();
                let states: Vec<_> = (0..8).map(|_| store.create("s", 0_u32)).collect();
                for (i, state) in states.iter().enumerate() {
                    for w in 0..64 {
                        store.watch(state.id(), w + i as u32 * 8);
                    }
                }
                (store, states)
            },
            |(mut store, states)| {
                for state in &states {
                    store.set(*state, 1);
                }
                black_box(store.take_pending().len())
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_pipeline(c: &mut Criterion) {
    let mut group = c.benchmark_group("pipeline/run");

    for &len in &[1_usize, 4, 16] {
        let mut pipeline = Pipeline::<u64>::new();
        for i in 0..len {
            pipeline.intercept(Phase::Click, i as u64);
        }
        group.bench_function(BenchmarkId::new("walk", len), |b| {
            b.iter(|| {
                let mut total = 0_u64;
                let outcome = pipeline.run(Phase::Click, &mut total, |step, _, total| {
                    *total += *step;
                    Ok::<(), ()>(())
                });
                black_box((outcome, total))
            });
        });
        group.bench_function(BenchmarkId::new("finish_first", len), |b| {
            b.iter(|| {
                let mut total = 0_u64;
                let outcome = pipeline.run(Phase::Click, &mut total, |step, ctx, total| {
                    *total += *step;
                    ctx.finish();
                    Ok::<(), ()>(())
                });
                black_box((outcome, total))
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_fan_out, bench_pipeline);
criterion_main!(benches);
