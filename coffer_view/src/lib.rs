// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coffer View: slot-based menu components over a container.
//!
//! A menu is a grid of slots. This crate keeps a declarative component tree in
//! sync with such a grid, whatever the grid really is: the platform plugs its
//! container in through the [`Container`] trait and forwards clicks, opens and
//! closes to a [`Frame`].
//!
//! ## Core Concepts
//!
//! - **Views** ([`View`], [`ViewConfig`]): a menu definition. It declares
//!   components through builders ([`ItemBuilder`], [`CompositeBuilder`],
//!   [`PaginationBuilder`], [`View::layout_slot`]) and carries a pipeline with
//!   the default interceptors installed.
//! - **Sessions** ([`RenderContext`]): one per open (view, viewer) pair. A
//!   session instantiates the declared components into an arena and owns the
//!   map from slot to the component shown there.
//! - **Components** ([`Component`], [`ComponentKind`]): records of a closed set
//!   of kinds. Each kind has a stateless [`ComponentHandle`] that drives render,
//!   update, click and clear.
//! - **Pipeline** ([`Interceptor`], [`Subject`]): every lifecycle event runs as
//!   a phase of a [`coffer_pipeline::Pipeline`]. Container writes are only
//!   accepted while a phase runs; anything else is an
//!   [`Error::InventoryModification`].
//! - **States** ([`State`]): shared values in the frame's
//!   [`StateStore`](coffer_state::StateStore). Components that watch a state are
//!   updated after it changes, once per flush round however many of their
//!   states changed.
//!
//! ## Quick Start
//!
//! ```rust
//! use coffer_view::{
//!     ClickKind, Frame, ItemBuilder, MemoryContainer, PageSwitch, PaginationBuilder, View,
//!     ViewConfig, ViewerId,
//! };
//!
//! let mut frame = Frame::<String>::new();
//! let balance = frame.state("balance", 30_u32);
//!
//! let mut view = View::new(
//!     ViewConfig::rows(2)
//!         .title("Shop")
//!         .layout(["OOOOOOOOO", "p   b   n"]),
//! );
//! view.component(
//!     PaginationBuilder::from_items(["apple", "bread", "cake"].repeat(4), |name: &&str, _| {
//!         ItemBuilder::new().with_item(name.to_string())
//!     })
//!     .key("wares"),
//! );
//! view.slot(
//!     13,
//!     ItemBuilder::new()
//!         .key("balance")
//!         .watch(balance)
//!         .render_with(move |ctx| {
//!             let text = format!("{} coins", ctx.get(balance));
//!             ctx.set_item(text);
//!         }),
//! );
//! view.slot(
//!     17,
//!     ItemBuilder::new()
//!         .with_item("next".to_string())
//!         .on_click(|ctx| ctx.switch_page("wares", PageSwitch::Next)),
//! );
//! let shop = frame.register(view).unwrap();
//!
//! let viewer = ViewerId(7);
//! frame.open(shop, viewer, MemoryContainer::new(18), ()).unwrap();
//! frame.set_state(balance, 12).unwrap();
//! frame.click(viewer, 17, ClickKind::Left).unwrap();
//!
//! let session = frame.session(viewer).unwrap();
//! let container = session.container();
//! assert_eq!(container.slot_item(13).map(String::as_str), Some("12 coins"));
//! assert_eq!(container.slot_item(0).map(String::as_str), Some("apple"));
//! assert_eq!(container.slot_item(2).map(String::as_str), Some("cake"));
//! assert_eq!(container.slot_item(3), None);
//! assert_eq!(session.component("wares").and_then(|c| c.page()).unwrap().page, 1);
//! ```
//!
//! ## Reconciliation rules
//!
//! - A component renders only while its display predicate holds. When an update
//!   finds the predicate false, the component is cleared and hidden; when it
//!   holds again, the component renders.
//! - Items without a render handler or predicate are static: plain updates skip
//!   them, forced updates re-render them.
//! - Clearing a slot only empties it if the component clearing it is still the
//!   one shown there.
//! - An item that moves to a new slot clears its old one first. Moving onto a
//!   slot another visible component shows is an [`Error::SlotCollision`].
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. The `std` feature only forwards to
//! the dependencies.

#![no_std]

extern crate alloc;

mod arena;
mod builder;
mod component;
mod config;
mod container;
mod context;
mod error;
mod frame;
mod handle;
mod id;
mod interceptors;
mod pagination;
mod render;
mod view;

pub use builder::{
    ComponentBuilder, CompositeBuilder, ItemBuilder, LayoutSlotBuilder, PageTarget, Paginated,
    PaginationBuilder, Placement,
};
pub use component::{Component, ComponentFlags, ComponentKind, PageInfo};
pub use config::{AVAILABLE_SLOT, ROW_WIDTH, ViewConfig};
pub use container::{Container, MemoryContainer, SlotGuard};
pub use context::{
    ClickKind, CloseContext, ComponentClearContext, ComponentRenderContext,
    ComponentUpdateContext, DisplayContext, FirstRenderContext, OpenContext, SlotClickContext,
    Subject, UpdateReason,
};
pub use error::{Error, Result};
pub use frame::{ClickOutcome, Frame};
pub use handle::{
    ComponentHandle, CompositeHandle, ItemHandle, LayoutSlotHandle, PaginationHandle,
};
pub use id::{ComponentId, SessionId, ViewKey, ViewerId, Watcher};
pub use pagination::PageSwitch;
pub use render::RenderContext;
pub use view::{Interceptor, View};

pub use coffer_pipeline::{Phase, PipelineContext};
pub use coffer_state::{State, StateId};
