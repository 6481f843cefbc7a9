// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Benchmarks for `coffer_view` render passes and state-driven updates.

use criterion::{BatchSize, BenchmarkId, Criterion, black_box, criterion_group, criterion_main};

use coffer_state::State;
use coffer_view::{
    ClickKind, Frame, ItemBuilder, MemoryContainer, PageSwitch, PageTarget, PaginationBuilder,
    View, ViewConfig, ViewKey, ViewerId,
};

const ROWS: usize = 6;

/// A full chest of items, every one watching `coins`.
fn watching_menu(frame: &mut Frame<u64>, coins: State<u64>) -> ViewKey {
    let mut view = View::new(ViewConfig::rows(ROWS));
    for _ in 0..ROWS * 9 {
        view.available_slot(ItemBuilder::new().watch(coins).render_with(move |ctx| {
            let value = *ctx.get(coins);
            ctx.set_item(value);
        }));
    }
    frame.register(view).expect("valid view")
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("view/render");

    group.bench_function("open_close", |b| {
        let mut frame = Frame::new();
        let coins = frame.state("coins", 0_u64);
        let menu = watching_menu(&mut frame, coins);
        b.iter(|| {
            frame
                .open(menu, ViewerId(1), MemoryContainer::new(ROWS * 9), ())
                .expect("open");
            black_box(frame.close(ViewerId(1)).expect("close"))
        });
    });

    for &sessions in &[1_u64, 8, 32] {
        group.bench_function(BenchmarkId::new("state_fan_out", sessions), |b| {
            let mut frame = Frame::new();
            let coins = frame.state("coins", 0_u64);
            let menu = watching_menu(&mut frame, coins);
            for viewer in 0..sessions {
                frame
                    .open(menu, ViewerId(viewer), MemoryContainer::new(ROWS * 9), ())
                    .expect("open");
            }
            b.iter(|| {
                frame.update_state(coins, |c| *c += 1).expect("update");
                black_box(frame.get(coins))
            });
        });
    }

    group.bench_function("page_switch", |b| {
        b.iter_batched(
            || {
                let mut frame = Frame::new();
                let mut view = View::new(ViewConfig::rows(ROWS));
                view.component(
                    PaginationBuilder::from_items((0..1000_u64).collect::<Vec<_>>(), |n: &u64, _| {
                        ItemBuilder::new().with_item(*n)
                    })
                    .key("pages")
                    .target(PageTarget::Slots((0..45).collect())),
                );
                view.slot(
                    53,
                    ItemBuilder::new()
                        .with_item(0)
                        .on_click(|ctx| ctx.switch_page("pages", PageSwitch::Next)),
                );
                let menu = frame.register(view).expect("valid view");
                frame
                    .open(menu, ViewerId(1), MemoryContainer::new(ROWS * 9), ())
                    .expect("open");
                frame
            },
            |mut frame| {
                for _ in 0..4 {
                    frame
                        .click(ViewerId(1), 53, ClickKind::Left)
                        .expect("click");
                }
                black_box(frame)
            },
            BatchSize::SmallInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_render);
criterion_main!(benches);
