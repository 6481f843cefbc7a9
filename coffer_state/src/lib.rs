// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coffer State: versioned state cells that know who reads them.
//!
//! ## Core Concepts
//!
//! - **States** ([`State`], [`StateId`]): typed handles into a [`StateStore`].
//!   A handle is `Copy` and carries its value type, so reads and writes are
//!   checked at compile time.
//! - **Watchers**: every state keeps a small set of watcher keys `W`. Watchers
//!   are plain `Copy` keys (for example arena indices), never owning references,
//!   so a state never keeps a reader alive. Keys that stop resolving are skipped
//!   by the embedder and can be pruned with [`StateStore::retain_watchers`].
//! - **Batches** ([`UpdateBatch`]): every write bumps the state's version and
//!   schedules its watchers into a pending batch. A watcher appears in a batch at
//!   most once, however many writes or states touched it.
//!
//! ## Quick Start
//!
//! ```rust
//! use coffer_state::StateStore;
//!
//! let mut store = StateStore::<u32>::new();
//! let coins = store.create("coins", 0_u64);
//! let gems = store.create("gems", 0_u64);
//!
//! // Component 7 reads both states, component 8 only reads coins.
//! store.watch(coins.id(), 7);
//! store.watch(gems.id(), 7);
//! store.watch(coins.id(), 8);
//!
//! store.set(coins, 10);
//! store.set(coins, 20);
//! store.update(gems, |g| *g += 1);
//!
//! assert_eq!(*store.get(coins), 20);
//! assert_eq!(store.version(coins.id()), Some(2));
//!
//! // Three writes, two watchers, one entry each.
//! let batch = store.take_pending();
//! assert_eq!(batch.watchers(), &[7, 8]);
//! assert_eq!(batch.changed_states(), &[coins.id(), gems.id()]);
//! assert!(!store.has_pending());
//! ```
//!
//! ## `no_std` Support
//!
//! This crate is `no_std` and uses `alloc`. It does not depend on `std`.

#![no_std]

extern crate alloc;

mod batch;
mod error;
mod id;
mod store;
mod value;

pub use batch::UpdateBatch;
pub use error::StateError;
pub use id::{State, StateId};
pub use store::StateStore;
pub use value::StateValue;
