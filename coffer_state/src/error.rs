// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! State access errors.

use core::fmt;

use crate::id::StateId;

/// Error returned by the fallible [`StateStore`](crate::StateStore) accessors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StateError {
    /// The id was not created by this store.
    Unknown(StateId),
    /// The handle's value type differs from the stored value's type.
    TypeMismatch {
        /// The state being accessed.
        id: StateId,
        /// Type requested by the handle.
        expected: &'static str,
        /// Type actually stored.
        found: &'static str,
    },
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown(id) => write!(f, "{id} does not belong to this store"),
            Self::TypeMismatch {
                id,
                expected,
                found,
            } => write!(f, "{id} holds a `{found}`, not a `{expected}`"),
        }
    }
}

impl core::error::Error for StateError {}
