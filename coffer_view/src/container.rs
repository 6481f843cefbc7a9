// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Containers: the slot surface a session renders onto.

use alloc::boxed::Box;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use smallvec::SmallVec;
use tracing::trace;

use crate::error::{Error, Result};

/// A fixed-size, slot-addressable render target for items of type `I`.
///
/// Implemented by the platform layer. Index checks happen before the adapter
/// is called, so implementations may assume `slot < slot_count()`.
pub trait Container<I>: Any {
    /// Number of slots.
    fn slot_count(&self) -> usize;

    /// Shows `item` at `slot`, replacing whatever was there.
    fn set_slot_item(&mut self, slot: usize, item: I);

    /// Empties `slot`.
    fn remove_slot_item(&mut self, slot: usize);

    /// The item currently shown at `slot`.
    fn slot_item(&self, slot: usize) -> Option<&I>;

    /// Returns `true` for slots the platform fills itself (crafting results and
    /// the like). Items without a payload are allowed on these.
    fn is_reserved_slot(&self, slot: usize) -> bool {
        let _ = slot;
        false
    }

    /// Closes the container for its viewer.
    fn close(&mut self) {}
}

/// A [`Container`] backed by a `Vec`, counting every call it receives.
///
/// ```
/// use coffer_view::{Container, MemoryContainer};
///
/// let mut chest = MemoryContainer::new(27).with_reserved(0);
/// chest.set_slot_item(4, "apple");
/// chest.remove_slot_item(4);
/// assert!(chest.is_reserved_slot(0));
/// assert_eq!((chest.writes(), chest.removals()), (1, 1));
/// ```
#[derive(Clone, Debug)]
pub struct MemoryContainer<I> {
    slots: Vec<Option<I>>,
    reserved: SmallVec<[usize; 2]>,
    writes: usize,
    removals: usize,
    closes: usize,
}

impl<I> MemoryContainer<I> {
    /// Creates an empty container with `size` slots.
    #[must_use]
    pub fn new(size: usize) -> Self {
        let mut slots = Vec::with_capacity(size);
        slots.resize_with(size, || None);
        Self {
            slots,
            reserved: SmallVec::new(),
            writes: 0,
            removals: 0,
            closes: 0,
        }
    }

    /// Marks `slot` as reserved.
    #[must_use]
    pub fn with_reserved(mut self, slot: usize) -> Self {
        if !self.reserved.contains(&slot) {
            self.reserved.push(slot);
        }
        self
    }

    /// The item at `slot`.
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<&I> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Occupied slots in index order.
    pub fn items(&self) -> impl Iterator<Item = (usize, &I)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(slot, item)| item.as_ref().map(|item| (slot, item)))
    }

    /// Number of `set_slot_item` calls so far.
    #[must_use]
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Number of `remove_slot_item` calls so far.
    #[must_use]
    pub fn removals(&self) -> usize {
        self.removals
    }

    /// Number of `close` calls so far.
    #[must_use]
    pub fn closes(&self) -> usize {
        self.closes
    }
}

impl<I: 'static> Container<I> for MemoryContainer<I> {
    fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn set_slot_item(&mut self, slot: usize, item: I) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = Some(item);
            self.writes += 1;
        }
    }

    fn remove_slot_item(&mut self, slot: usize) {
        if let Some(target) = self.slots.get_mut(slot) {
            *target = None;
            self.removals += 1;
        }
    }

    fn slot_item(&self, slot: usize) -> Option<&I> {
        self.get(slot)
    }

    fn is_reserved_slot(&self, slot: usize) -> bool {
        self.reserved.contains(&slot)
    }

    fn close(&mut self) {
        self.closes += 1;
    }
}

/// The container of an open session, guarded against writes that bypass the
/// pipeline.
///
/// Writes are accepted only while a pipeline phase runs for the session and
/// only for in-range slots. Anything else fails with
/// [`Error::InventoryModification`] or [`Error::SlotOutOfRange`]. Accepted
/// writes reach the adapter immediately.
pub struct SlotGuard<I> {
    inner: Box<dyn Container<I>>,
    depth: u32,
}

impl<I: 'static> SlotGuard<I> {
    pub(crate) fn new(inner: Box<dyn Container<I>>) -> Self {
        Self { inner, depth: 0 }
    }

    /// Number of slots of the wrapped container.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.inner.slot_count()
    }

    /// The item currently shown at `slot`.
    #[must_use]
    pub fn slot_item(&self, slot: usize) -> Option<&I> {
        if slot < self.slot_count() {
            self.inner.slot_item(slot)
        } else {
            None
        }
    }

    /// See [`Container::is_reserved_slot`].
    #[must_use]
    pub fn is_reserved_slot(&self, slot: usize) -> bool {
        slot < self.slot_count() && self.inner.is_reserved_slot(slot)
    }

    /// Returns `true` while a pipeline phase runs for this session.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.depth > 0
    }

    /// Writes `item` to `slot`.
    pub fn set(&mut self, slot: usize, item: I) -> Result<()> {
        self.check(slot)?;
        trace!(slot, "container write");
        self.inner.set_slot_item(slot, item);
        Ok(())
    }

    /// Empties `slot`.
    pub fn remove(&mut self, slot: usize) -> Result<()> {
        self.check(slot)?;
        trace!(slot, "container remove");
        self.inner.remove_slot_item(slot);
        Ok(())
    }

    /// Borrows the wrapped container as its concrete type.
    #[must_use]
    pub fn downcast_ref<C: Container<I>>(&self) -> Option<&C> {
        let inner: &dyn Any = &*self.inner;
        inner.downcast_ref()
    }

    fn check(&self, slot: usize) -> Result<()> {
        if !self.is_active() {
            return Err(Error::InventoryModification { slot });
        }
        let size = self.slot_count();
        if slot >= size {
            return Err(Error::SlotOutOfRange { slot, size });
        }
        Ok(())
    }

    pub(crate) fn enter(&mut self) {
        self.depth += 1;
    }

    pub(crate) fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    pub(crate) fn close(&mut self) {
        self.inner.close();
    }

    pub(crate) fn into_inner(self) -> Box<dyn Container<I>> {
        self.inner
    }
}

impl<I: 'static> fmt::Debug for SlotGuard<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SlotGuard")
            .field("slots", &self.inner.slot_count())
            .field("active", &(self.depth > 0))
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn guard() -> SlotGuard<char> {
        SlotGuard::new(Box::new(MemoryContainer::new(9).with_reserved(8)))
    }

    #[test]
    fn writes_outside_a_phase_are_rejected() {
        let mut guard = guard();
        let err = guard.set(2, 'x').unwrap_err();
        assert!(err.is_protocol_violation());
        assert!(matches!(guard.remove(2), Err(Error::InventoryModification { slot: 2 })));
        let inner = guard.downcast_ref::<MemoryContainer<char>>().unwrap();
        assert_eq!(inner.writes(), 0);
    }

    #[test]
    fn writes_inside_a_phase_reach_the_container() {
        let mut guard = guard();
        guard.enter();
        guard.set(2, 'x').unwrap();
        guard.enter();
        guard.leave();
        assert!(guard.is_active());
        guard.remove(2).unwrap();
        guard.set(3, 'y').unwrap();
        guard.leave();
        assert!(!guard.is_active());

        assert_eq!(guard.slot_item(3), Some(&'y'));
        assert_eq!(guard.slot_item(2), None);
        let inner = guard.downcast_ref::<MemoryContainer<char>>().unwrap();
        assert_eq!((inner.writes(), inner.removals()), (2, 1));
    }

    #[test]
    fn out_of_range_is_a_configuration_error() {
        let mut guard = guard();
        guard.enter();
        let err = guard.set(9, 'x').unwrap_err();
        assert!(matches!(err, Error::SlotOutOfRange { slot: 9, size: 9 }));
        assert!(err.is_configuration());
        assert_eq!(guard.slot_item(40), None);
    }

    #[test]
    fn debug_reports_size_and_phase() {
        use alloc::format;

        let mut guard = guard();
        assert_eq!(
            format!("{guard:?}"),
            "SlotGuard { slots: 9, active: false, .. }"
        );
        guard.enter();
        assert!(format!("{guard:?}").contains("active: true"));
    }

    #[test]
    fn reserved_slots_come_from_the_adapter() {
        let guard = guard();
        assert!(guard.is_reserved_slot(8));
        assert!(!guard.is_reserved_slot(0));
        assert!(!guard.is_reserved_slot(100));
    }
}
