// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Identifiers for components, sessions, viewers and views.

use core::fmt;

/// Identifier of a component inside one session.
///
/// A slot index plus a generation counter, the same scheme as an arena handle:
///
/// - A fresh slot starts at generation `1`.
/// - Removing a component frees its slot; ids that pointed to it become stale.
/// - Reusing a freed slot increments its generation, so stale ids never alias
///   the new component.
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u32, u32);

impl ComponentId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }

    /// Arena slot index.
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0
    }

    /// Generation of the arena slot when this id was issued.
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.1
    }
}

impl fmt::Debug for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ComponentId({}v{})", self.0, self.1)
    }
}

/// Identifier of one open session. Never reused within a [`Frame`](crate::Frame).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(u64);

impl SessionId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

/// Opaque identity of whoever looks at a menu, supplied by the platform layer.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ViewerId(pub u64);

impl fmt::Display for ViewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "viewer#{}", self.0)
    }
}

/// Handle to a [`View`](crate::View) registered with a [`Frame`](crate::Frame).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ViewKey(u32);

impl ViewKey {
    pub(crate) const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

/// A component of a specific session, as seen by a state.
///
/// States hold watchers by value. Once the session closes or the component is
/// freed the watcher no longer resolves and is skipped.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Watcher {
    /// Owning session.
    pub session: SessionId,
    /// The component within that session.
    pub component: ComponentId,
}
