// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Collapsed update batches.

use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;
use smallvec::SmallVec;

use crate::id::StateId;

/// Watchers scheduled for an update, each at most once.
///
/// Watchers keep the order in which they were first scheduled, so draining a
/// batch is deterministic. The batch also remembers which states changed.
///
/// ```
/// use coffer_state::{StateId, UpdateBatch};
///
/// let mut batch = UpdateBatch::<u32>::new();
/// assert!(batch.schedule(3));
/// assert!(batch.schedule(1));
/// assert!(!batch.schedule(3));
/// batch.record_change(StateId::new(0));
///
/// assert_eq!(batch.watchers(), &[3, 1]);
/// assert_eq!(batch.len(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct UpdateBatch<W>
where
    W: Copy + Eq + Hash,
{
    order: Vec<W>,
    seen: HashSet<W>,
    changed: SmallVec<[StateId; 4]>,
}

impl<W> Default for UpdateBatch<W>
where
    W: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<W> UpdateBatch<W>
where
    W: Copy + Eq + Hash,
{
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self {
            order: Vec::new(),
            seen: HashSet::new(),
            changed: SmallVec::new(),
        }
    }

    /// Schedules `watcher`.
    ///
    /// Returns `true` if it was not already part of this batch.
    pub fn schedule(&mut self, watcher: W) -> bool {
        if self.seen.insert(watcher) {
            self.order.push(watcher);
            true
        } else {
            false
        }
    }

    /// Records that `state` changed while this batch was open.
    pub fn record_change(&mut self, state: StateId) {
        if !self.changed.contains(&state) {
            self.changed.push(state);
        }
    }

    /// Scheduled watchers, in first-scheduled order.
    #[must_use]
    pub fn watchers(&self) -> &[W] {
        &self.order
    }

    /// States that changed, in first-changed order.
    #[must_use]
    pub fn changed_states(&self) -> &[StateId] {
        &self.changed
    }

    /// Returns `true` if `watcher` is scheduled.
    #[must_use]
    pub fn contains(&self, watcher: W) -> bool {
        self.seen.contains(&watcher)
    }

    /// Number of scheduled watchers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Returns `true` if nothing is scheduled and no state changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty() && self.changed.is_empty()
    }

    /// Empties the batch, keeping its allocations.
    pub fn clear(&mut self) {
        self.order.clear();
        self.seen.clear();
        self.changed.clear();
    }
}

impl<W> IntoIterator for UpdateBatch<W>
where
    W: Copy + Eq + Hash,
{
    type Item = W;
    type IntoIter = alloc::vec::IntoIter<W>;

    fn into_iter(self) -> Self::IntoIter {
        self.order.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn duplicates_collapse_and_order_is_kept() {
        let mut batch = UpdateBatch::<u8>::new();
        for w in [5, 2, 5, 9, 2, 2] {
            batch.schedule(w);
        }
        assert_eq!(batch.watchers(), &[5, 2, 9]);
        assert!(batch.contains(9));
        assert!(!batch.contains(1));
        assert_eq!(batch.into_iter().collect::<Vec<_>>(), vec![5, 2, 9]);
    }

    #[test]
    fn changes_are_recorded_once() {
        let mut batch = UpdateBatch::<u8>::new();
        batch.record_change(StateId::new(1));
        batch.record_change(StateId::new(1));
        batch.record_change(StateId::new(0));
        assert_eq!(batch.changed_states(), &[StateId::new(1), StateId::new(0)]);
        assert!(!batch.is_empty());
        assert_eq!(batch.len(), 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut batch = UpdateBatch::<u8>::new();
        batch.schedule(1);
        batch.record_change(StateId::new(0));
        batch.clear();
        assert!(batch.is_empty());
        assert!(batch.schedule(1));
    }
}
