// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pipeline phases.

use core::fmt;

/// A named pipeline stage.
///
/// The set of phases is closed and ordered. [`Phase::ALL`] lists them in the
/// order a component moves through them over its lifetime.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    /// A component is placed and written to the container.
    Render,
    /// A rendered component is asked to reflect new data.
    Update,
    /// A viewer interacted with a slot.
    Click,
    /// A component's slot content is removed from the container.
    Clear,
}

impl Phase {
    /// Every phase, in pipeline order.
    pub const ALL: [Self; 4] = [Self::Render, Self::Update, Self::Click, Self::Clear];

    /// Number of phases.
    pub const COUNT: usize = Self::ALL.len();

    /// Stable name of this phase, suitable for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Render => "component-render",
            Self::Update => "component-update",
            Self::Click => "component-click",
            Self::Clear => "component-clear",
        }
    }

    /// Position of this phase in [`Phase::ALL`].
    #[must_use]
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
