// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared fixtures for the `coffer_view` integration tests.

#![allow(dead_code, reason = "each test binary uses a different subset")]

use std::cell::Cell;
use std::rc::Rc;

use coffer_view::{Container, Frame, ItemBuilder, MemoryContainer, ViewerId};

pub const ALICE: ViewerId = ViewerId(1);
pub const BOB: ViewerId = ViewerId(2);

/// A static item showing `name`.
pub fn item(name: &str) -> ItemBuilder<String> {
    ItemBuilder::new().with_item(name.to_string())
}

/// Occupied slots of the viewer's container, in slot order.
pub fn shown(frame: &Frame<String>, viewer: ViewerId) -> Vec<(usize, String)> {
    let container = frame.session(viewer).expect("session is open").container();
    (0..container.slot_count())
        .filter_map(|slot| container.slot_item(slot).map(|item| (slot, item.clone())))
        .collect()
}

/// The item at `slot` of the viewer's container.
pub fn at(frame: &Frame<String>, viewer: ViewerId, slot: usize) -> Option<String> {
    frame
        .session(viewer)
        .expect("session is open")
        .container()
        .slot_item(slot)
        .cloned()
}

/// Container writes so far, for sessions opened on a [`MemoryContainer`].
pub fn writes(frame: &Frame<String>, viewer: ViewerId) -> usize {
    frame
        .session(viewer)
        .expect("session is open")
        .container()
        .downcast_ref::<MemoryContainer<String>>()
        .expect("memory container")
        .writes()
}

/// A counter shared with handlers.
#[derive(Clone, Debug, Default)]
pub struct Counter(Rc<Cell<usize>>);

impl Counter {
    pub fn bump(&self) {
        self.0.set(self.0.get() + 1);
    }

    pub fn get(&self) -> usize {
        self.0.get()
    }
}

/// A memory container that reports `close` calls to a [`Counter`], so they
/// can be observed after the frame dropped the container.
#[derive(Debug)]
pub struct Tracked {
    inner: MemoryContainer<String>,
    closes: Counter,
}

impl Tracked {
    pub fn new(size: usize) -> (Self, Counter) {
        let closes = Counter::default();
        let tracked = Self {
            inner: MemoryContainer::new(size),
            closes: closes.clone(),
        };
        (tracked, closes)
    }
}

impl Container<String> for Tracked {
    fn slot_count(&self) -> usize {
        self.inner.slot_count()
    }

    fn set_slot_item(&mut self, slot: usize, item: String) {
        self.inner.set_slot_item(slot, item);
    }

    fn remove_slot_item(&mut self, slot: usize) {
        self.inner.remove_slot_item(slot);
    }

    fn slot_item(&self, slot: usize) -> Option<&String> {
        self.inner.slot_item(slot)
    }

    fn close(&mut self) {
        self.closes.bump();
    }
}
