// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State identification types.
//!
//! [`StateId`] identifies a state at runtime; [`State<T>`] adds the value type.

use core::fmt;
use core::hash::{Hash, Hasher};
use core::marker::PhantomData;

/// A runtime state identifier, unique within one [`StateStore`](crate::StateStore).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateId(u32);

impl StateId {
    /// Creates a state ID from a raw index.
    ///
    /// Normally obtained from [`StateStore::create`](crate::StateStore::create).
    #[must_use]
    #[inline]
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    /// Returns the raw index.
    #[must_use]
    #[inline]
    pub const fn index(self) -> u32 {
        self.0
    }

    #[inline]
    pub(crate) const fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Debug for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StateId").field(&self.0).finish()
    }
}

impl fmt::Display for StateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "state#{}", self.0)
    }
}

/// A typed state handle.
///
/// `State<T>` is a [`StateId`] plus a phantom value type, the same size as the
/// bare id. Handles are `Copy` and can be captured freely by handlers.
pub struct State<T> {
    id: StateId,
    _marker: PhantomData<fn() -> T>,
}

impl<T> State<T> {
    /// Wraps an id registered with value type `T`.
    ///
    /// Pairing an id with the wrong `T` is caught at access time and reported
    /// as [`StateError::TypeMismatch`](crate::StateError::TypeMismatch).
    #[must_use]
    #[inline]
    pub const fn from_id(id: StateId) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Returns the untyped id.
    #[must_use]
    #[inline]
    pub const fn id(self) -> StateId {
        self.id
    }
}

impl<T> Copy for State<T> {}

impl<T> Clone for State<T> {
    #[inline]
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> PartialEq for State<T> {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for State<T> {}

impl<T> Hash for State<T> {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> fmt::Debug for State<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("State")
            .field("id", &self.id)
            .field("type", &core::any::type_name::<T>())
            .finish()
    }
}
