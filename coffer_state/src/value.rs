// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Type-erased state value storage.

use alloc::boxed::Box;
use core::any::{Any, TypeId};
use core::fmt;

/// A type-erased state value.
///
/// The value lives on the heap next to its type name, which is kept only for
/// error messages.
///
/// ```rust
/// use coffer_state::StateValue;
///
/// let mut value = StateValue::new(41_u8);
/// *value.downcast_mut::<u8>().unwrap() += 1;
/// assert_eq!(value.downcast_ref::<u8>(), Some(&42));
/// assert!(value.downcast_ref::<u16>().is_none());
/// ```
pub struct StateValue {
    inner: Box<dyn Any>,
    type_name: &'static str,
}

impl StateValue {
    /// Erases `value`.
    #[must_use]
    pub fn new<T: 'static>(value: T) -> Self {
        Self {
            inner: Box::new(value),
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the [`TypeId`] of the contained value.
    #[must_use]
    #[inline]
    pub fn value_type_id(&self) -> TypeId {
        (*self.inner).type_id()
    }

    /// Name of the contained type.
    #[must_use]
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns `true` if the contained value is a `T`.
    #[must_use]
    #[inline]
    pub fn is<T: 'static>(&self) -> bool {
        self.inner.is::<T>()
    }

    /// Borrows the value as `T`, if it is one.
    #[must_use]
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }

    /// Mutably borrows the value as `T`, if it is one.
    #[must_use]
    pub fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.inner.downcast_mut()
    }
}

impl fmt::Debug for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateValue")
            .field("type", &self.type_name)
            .finish_non_exhaustive()
    }
}
