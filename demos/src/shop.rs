// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A console shop.
//!
//! Loads the menu layout from JSON, opens it for one viewer and replays a few
//! clicks, printing the container after each one.
//!
//! Run:
//! - `cargo run -p coffer_demos --bin shop`
//! - `RUST_LOG=coffer_view=trace cargo run -p coffer_demos --bin shop`

use std::error::Error;

use coffer_view::{
    ClickKind, Frame, ItemBuilder, MemoryContainer, PageSwitch, PaginationBuilder, Placement,
    View, ViewConfig, ViewerId,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const MENU: &str = include_str!("shop.json");

const WARES: &[(&str, u32)] = &[
    ("apple", 2),
    ("bread", 3),
    ("cheese", 7),
    ("dagger", 25),
    ("elixir", 40),
    ("flint", 1),
    ("gloves", 9),
    ("helmet", 30),
    ("iron", 12),
    ("jerky", 4),
];

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("coffer_view=debug"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    init_tracing();

    let config: ViewConfig = serde_json::from_str(MENU)?;
    info!(title = %config.title, size = config.size, "menu loaded");

    let mut frame = Frame::<String>::new();
    let balance = frame.state("balance", 50_u32);

    let mut view = View::new(config);
    view.layout_slot('#', |_| ItemBuilder::new().with_item("·".to_string()));
    view.component(
        PaginationBuilder::from_items(WARES, move |&(name, price): &(&str, u32), _| {
            ItemBuilder::new()
                .with_item(format!("{name}:{price}"))
                .on_click(move |ctx| {
                    if *ctx.get(balance) >= price {
                        ctx.update_state(balance, |b| *b -= price);
                    }
                })
        })
        .key("wares"),
    );
    view.component(
        ItemBuilder::new()
            .placed(Placement::Layout('<'))
            .with_item("<".to_string())
            .on_click(|ctx| ctx.switch_page("wares", PageSwitch::Previous)),
    );
    view.component(
        ItemBuilder::new()
            .placed(Placement::Layout('>'))
            .with_item(">".to_string())
            .on_click(|ctx| ctx.switch_page("wares", PageSwitch::Next)),
    );
    view.component(
        ItemBuilder::new()
            .key("balance")
            .placed(Placement::Layout('$'))
            .watch(balance)
            .render_with(move |ctx| {
                let text = format!("${}", ctx.get(balance));
                ctx.set_item(text);
            }),
    );
    let shop = frame.register(view)?;

    let viewer = ViewerId(1);
    frame.open(shop, viewer, MemoryContainer::new(27), ())?;
    print_menu(&frame, viewer, "opened");

    for (slot, label) in [
        (12, "bought cheese"),
        (25, "next page"),
        (10, "bought helmet"),
        (11, "bought iron"),
        (11, "iron is too expensive now"),
        (19, "previous page"),
    ] {
        let outcome = frame.click(viewer, slot, ClickKind::Left)?;
        info!(slot, cancelled = outcome.cancelled, component = ?outcome.component, "clicked");
        print_menu(&frame, viewer, label);
    }

    frame.close(viewer)?;
    info!(balance = *frame.get(balance), "closed");
    Ok(())
}

fn print_menu(frame: &Frame<String>, viewer: ViewerId, label: &str) {
    let Some(session) = frame.session(viewer) else {
        return;
    };
    let container = session.container();
    println!("-- {label}");
    for row in 0..container.slot_count() / 9 {
        let cells: Vec<String> = (row * 9..row * 9 + 9)
            .map(|slot| {
                let item = container.slot_item(slot).map_or("", String::as_str);
                format!("{item:^10}")
            })
            .collect();
        println!("|{}|", cells.join("|"));
    }
}
