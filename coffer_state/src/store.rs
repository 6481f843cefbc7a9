// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State storage, versioning and watcher bookkeeping.

use alloc::vec::Vec;
use core::hash::Hash;

use smallvec::SmallVec;

use crate::batch::UpdateBatch;
use crate::error::StateError;
use crate::id::{State, StateId};
use crate::value::StateValue;

/// Most states are read by a few components.
const INLINE_WATCHERS: usize = 4;

#[derive(Debug)]
struct Entry<W> {
    name: &'static str,
    value: StateValue,
    version: u64,
    watchers: SmallVec<[W; INLINE_WATCHERS]>,
}

/// Owner of every state cell, plus the batch of pending watcher updates.
///
/// # Type Parameters
///
/// - `W`: the watcher key. It must be `Copy + Eq + Hash` and should be a
///   non-owning reference such as an arena index, so that a state never keeps
///   its readers alive.
///
/// # Versioning
///
/// Each state starts at version `0`. Every write ([`set`](Self::set),
/// [`update`](Self::update), [`touch`](Self::touch)) increments the version by
/// one and schedules all current watchers of that state into the pending
/// [`UpdateBatch`]. The batch collapses duplicates, so a watcher is scheduled
/// once per batch no matter how many writes reached it.
#[derive(Debug)]
pub struct StateStore<W>
where
    W: Copy + Eq + Hash,
{
    entries: Vec<Entry<W>>,
    pending: UpdateBatch<W>,
}

impl<W> Default for StateStore<W>
where
    W: Copy + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<W> StateStore<W>
where
    W: Copy + Eq + Hash,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            pending: UpdateBatch::new(),
        }
    }

    /// Creates a new state holding `initial`.
    ///
    /// `name` is used for diagnostics only; it does not need to be unique.
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` states are created.
    pub fn create<T: 'static>(&mut self, name: &'static str, initial: T) -> State<T> {
        let index = u32::try_from(self.entries.len()).expect("state id space exhausted");
        self.entries.push(Entry {
            name,
            value: StateValue::new(initial),
            version: 0,
            watchers: SmallVec::new(),
        });
        State::from_id(StateId::new(index))
    }

    /// Number of states.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no state was created yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Diagnostic name of a state.
    #[must_use]
    pub fn name(&self, id: StateId) -> Option<&'static str> {
        self.entries.get(id.as_usize()).map(|e| e.name)
    }

    /// Current version of a state, or `None` for an unknown id.
    #[must_use]
    pub fn version(&self, id: StateId) -> Option<u64> {
        self.entries.get(id.as_usize()).map(|e| e.version)
    }

    fn entry(&self, id: StateId) -> Result<&Entry<W>, StateError> {
        self.entries.get(id.as_usize()).ok_or(StateError::Unknown(id))
    }

    fn entry_mut(&mut self, id: StateId) -> Result<&mut Entry<W>, StateError> {
        self.entries
            .get_mut(id.as_usize())
            .ok_or(StateError::Unknown(id))
    }

    // =========================================================================
    // Values
    // =========================================================================

    /// Reads a state.
    pub fn try_get<T: 'static>(&self, state: State<T>) -> Result<&T, StateError> {
        let entry = self.entry(state.id())?;
        entry
            .value
            .downcast_ref::<T>()
            .ok_or_else(|| mismatch::<T>(state.id(), &entry.value))
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if the handle was not created by this store or names the wrong type.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        match self.try_get(state) {
            Ok(value) => value,
            Err(err) => panic!("{err}"),
        }
    }

    /// Reads a state and clones the value.
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    #[must_use]
    pub fn get_cloned<T: Clone + 'static>(&self, state: State<T>) -> T {
        self.get(state).clone()
    }

    /// Replaces a state's value and schedules its watchers.
    ///
    /// Returns the new version.
    pub fn try_set<T: 'static>(&mut self, state: State<T>, value: T) -> Result<u64, StateError> {
        self.try_update(state, |slot| *slot = value)
    }

    /// Replaces a state's value and schedules its watchers.
    ///
    /// Returns the new version.
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    pub fn set<T: 'static>(&mut self, state: State<T>, value: T) -> u64 {
        match self.try_set(state, value) {
            Ok(version) => version,
            Err(err) => panic!("{err}"),
        }
    }

    /// Mutates a state's value in place and schedules its watchers.
    ///
    /// Returns the new version.
    pub fn try_update<T: 'static>(
        &mut self,
        state: State<T>,
        f: impl FnOnce(&mut T),
    ) -> Result<u64, StateError> {
        let id = state.id();
        let entry = self.entry_mut(id)?;
        let found = entry.value.type_name();
        let value = entry
            .value
            .downcast_mut::<T>()
            .ok_or(StateError::TypeMismatch {
                id,
                expected: core::any::type_name::<T>(),
                found,
            })?;
        f(value);
        Ok(self.bump(id))
    }

    /// Mutates a state's value in place and schedules its watchers.
    ///
    /// # Panics
    ///
    /// See [`get`](Self::get).
    pub fn update<T: 'static>(&mut self, state: State<T>, f: impl FnOnce(&mut T)) -> u64 {
        match self.try_update(state, f) {
            Ok(version) => version,
            Err(err) => panic!("{err}"),
        }
    }

    /// Marks a state as changed without touching its value.
    ///
    /// Useful when the value is an external source that changed behind the
    /// store's back. Returns the new version, or `None` for an unknown id.
    pub fn touch(&mut self, id: StateId) -> Option<u64> {
        self.entries.get(id.as_usize())?;
        Some(self.bump(id))
    }

    fn bump(&mut self, id: StateId) -> u64 {
        let entry = &mut self.entries[id.as_usize()];
        entry.version = entry.version.wrapping_add(1);
        self.pending.record_change(id);
        for &watcher in &entry.watchers {
            self.pending.schedule(watcher);
        }
        entry.version
    }

    // =========================================================================
    // Watchers
    // =========================================================================

    /// Registers `watcher` as a reader of `id`.
    ///
    /// Returns `true` if it was newly added, `false` if it was already watching
    /// or the id is unknown.
    pub fn watch(&mut self, id: StateId, watcher: W) -> bool {
        let Ok(entry) = self.entry_mut(id) else {
            return false;
        };
        if entry.watchers.contains(&watcher) {
            return false;
        }
        entry.watchers.push(watcher);
        true
    }

    /// Removes `watcher` from `id`. Returns `true` if it was watching.
    pub fn unwatch(&mut self, id: StateId, watcher: W) -> bool {
        let Ok(entry) = self.entry_mut(id) else {
            return false;
        };
        let before = entry.watchers.len();
        entry.watchers.retain(|w| *w != watcher);
        entry.watchers.len() != before
    }

    /// Current watchers of `id`, in registration order.
    #[must_use]
    pub fn watchers(&self, id: StateId) -> &[W] {
        self.entries
            .get(id.as_usize())
            .map(|e| e.watchers.as_slice())
            .unwrap_or(&[])
    }

    /// Keeps only the watchers of `id` for which `keep` returns `true`.
    ///
    /// Returns how many watchers were dropped.
    pub fn retain_watchers(&mut self, id: StateId, mut keep: impl FnMut(W) -> bool) -> usize {
        let Ok(entry) = self.entry_mut(id) else {
            return 0;
        };
        let before = entry.watchers.len();
        entry.watchers.retain(|w| keep(*w));
        before - entry.watchers.len()
    }

    // =========================================================================
    // Pending batch
    // =========================================================================

    /// Returns `true` if writes happened since the last [`take_pending`](Self::take_pending).
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// The batch accumulated since the last [`take_pending`](Self::take_pending).
    #[must_use]
    pub fn pending(&self) -> &UpdateBatch<W> {
        &self.pending
    }

    /// Takes the pending batch, leaving an empty one in its place.
    pub fn take_pending(&mut self) -> UpdateBatch<W> {
        core::mem::take(&mut self.pending)
    }
}

fn mismatch<T: 'static>(id: StateId, value: &StateValue) -> StateError {
    StateError::TypeMismatch {
        id,
        expected: core::any::type_name::<T>(),
        found: value.type_name(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::String;
    use alloc::vec;

    #[test]
    fn create_get_set() {
        let mut store = StateStore::<u32>::new();
        let title = store.create("title", String::from("Shop"));
        assert_eq!(store.get(title), "Shop");
        assert_eq!(store.version(title.id()), Some(0));
        assert_eq!(store.name(title.id()), Some("title"));

        assert_eq!(store.set(title, String::from("Bank")), 1);
        assert_eq!(store.get_cloned(title), "Bank");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn versions_count_every_write() {
        let mut store = StateStore::<u32>::new();
        let n = store.create("n", 0_i32);
        store.set(n, 1);
        store.update(n, |v| *v += 1);
        store.touch(n.id());
        assert_eq!(store.version(n.id()), Some(3));
        assert_eq!(*store.get(n), 2);
    }

    #[test]
    fn type_mismatch_is_reported() {
        let mut store = StateStore::<u32>::new();
        let n = store.create("n", 0_i32);
        let wrong: State<u8> = State::from_id(n.id());
        assert!(matches!(
            store.try_get(wrong),
            Err(StateError::TypeMismatch { found: "i32", .. })
        ));
        assert!(store.try_set(wrong, 1).is_err());
        // A failed write does not bump the version.
        assert_eq!(store.version(n.id()), Some(0));
        assert!(!store.has_pending());
    }

    #[test]
    fn unknown_id_is_reported() {
        let mut store = StateStore::<u32>::new();
        let ghost: State<u8> = State::from_id(StateId::new(9));
        assert_eq!(store.try_get(ghost), Err(StateError::Unknown(StateId::new(9))));
        assert_eq!(store.touch(StateId::new(9)), None);
        assert!(!store.watch(StateId::new(9), 1));
    }

    #[test]
    #[should_panic(expected = "does not belong")]
    fn get_panics_on_unknown_id() {
        let store = StateStore::<u32>::new();
        let _ = store.get(State::<u8>::from_id(StateId::new(0)));
    }

    #[test]
    fn writes_schedule_each_watcher_once() {
        let mut store = StateStore::<u32>::new();
        let a = store.create("a", 0_u8);
        let b = store.create("b", 0_u8);
        store.watch(a.id(), 1);
        store.watch(a.id(), 2);
        store.watch(b.id(), 2);
        store.watch(b.id(), 3);

        store.set(a, 1);
        store.set(a, 2);
        store.set(b, 1);
        store.set(a, 3);

        let batch = store.take_pending();
        assert_eq!(batch.watchers(), &[1, 2, 3]);
        assert_eq!(batch.changed_states(), &[a.id(), b.id()]);
        assert!(store.take_pending().is_empty());
    }

    #[test]
    fn watch_dedups_and_unwatch_removes() {
        let mut store = StateStore::<u32>::new();
        let a = store.create("a", ());
        assert!(store.watch(a.id(), 4));
        assert!(!store.watch(a.id(), 4));
        assert_eq!(store.watchers(a.id()), &[4]);
        assert!(store.unwatch(a.id(), 4));
        assert!(!store.unwatch(a.id(), 4));
        assert!(store.watchers(a.id()).is_empty());
    }

    #[test]
    fn retain_prunes_dead_watchers() {
        let mut store = StateStore::<u32>::new();
        let a = store.create("a", 0_u8);
        for w in [1, 2, 3, 4] {
            store.watch(a.id(), w);
        }
        let dropped = store.retain_watchers(a.id(), |w| w % 2 == 0);
        assert_eq!(dropped, 2);
        assert_eq!(store.watchers(a.id()), &[2, 4]);
        store.set(a, 1);
        assert_eq!(store.take_pending().into_iter().collect::<Vec<_>>(), vec![2, 4]);
    }

    #[test]
    fn change_without_watchers_still_records_state() {
        let mut store = StateStore::<u32>::new();
        let a = store.create("a", 0_u8);
        store.set(a, 1);
        assert!(store.has_pending());
        let batch = store.take_pending();
        assert_eq!(batch.len(), 0);
        assert_eq!(batch.changed_states(), &[a.id()]);
    }
}
