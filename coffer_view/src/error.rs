// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The crate error type.

use alloc::string::String;

use coffer_state::StateError;

use crate::id::ViewerId;

/// Result alias used throughout this crate.
pub type Result<T, E = Error> = core::result::Result<T, E>;

/// Everything that can go wrong while opening, rendering, updating or
/// clicking a view.
///
/// Variants fall into three groups, see [`is_configuration`](Self::is_configuration),
/// [`is_protocol_violation`](Self::is_protocol_violation) and
/// [`is_session_state`](Self::is_session_state). Configuration errors and
/// protocol violations are programming mistakes by the menu author and are
/// never swallowed.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An item has neither an item nor a render handler, and its slot is not
    /// reserved by the container.
    #[error("component `{key}` has no item and no render handler (slot {slot:?} is not reserved)")]
    MissingRenderPayload {
        /// Component key.
        key: String,
        /// The slot the component was bound to, if any.
        slot: Option<usize>,
    },
    /// A render handler left an item without a slot, and it had none before.
    #[error("component `{key}` was rendered without a slot")]
    MissingPosition {
        /// Component key.
        key: String,
    },
    /// A slot index lies outside the container or layout.
    #[error("slot {slot} is out of range for {size} slots")]
    SlotOutOfRange {
        /// The requested slot.
        slot: usize,
        /// Number of slots available.
        size: usize,
    },
    /// A render handler moved an item onto a slot shown by another component.
    #[error("component `{key}` cannot move to slot {slot}, `{occupant}` is shown there")]
    SlotCollision {
        /// The moving component.
        key: String,
        /// Target slot.
        slot: usize,
        /// The component currently shown at `slot`.
        occupant: String,
    },
    /// The view layout does not match the view size.
    #[error("invalid layout: {reason}")]
    InvalidLayout {
        /// What is wrong with it.
        reason: String,
    },
    /// No slot is left for a layout character.
    #[error("no free slot left for layout character `{character}`")]
    LayoutOverflow {
        /// The layout character.
        character: char,
    },
    /// Two components of one session share an explicit key.
    #[error("component key `{key}` is declared twice")]
    DuplicateKey {
        /// The duplicated key.
        key: String,
    },
    /// The container was written outside of a pipeline phase.
    #[error("slot {slot} was modified outside of a pipeline phase")]
    InventoryModification {
        /// The slot that was written.
        slot: usize,
    },
    /// The viewer already has an open session.
    #[error("{viewer} already has an open session")]
    SessionAlreadyOpen {
        /// The viewer.
        viewer: ViewerId,
    },
    /// The viewer has no open session.
    #[error("{viewer} has no open session")]
    SessionNotOpen {
        /// The viewer.
        viewer: ViewerId,
    },
    /// No live component answers to this key.
    #[error("no component `{key}` in this session")]
    UnknownComponent {
        /// The key, or the debug form of a stale id.
        key: String,
    },
    /// A page switch named a component that is not a pagination.
    #[error("component `{key}` is not a pagination")]
    NotPaginated {
        /// The key of the component.
        key: String,
    },
    /// The view key was not issued by this frame.
    #[error("view is not registered")]
    UnknownView,
    /// State updates kept scheduling more updates.
    #[error("state updates did not settle after {rounds} rounds")]
    UpdateLoop {
        /// Rounds drained before giving up.
        rounds: usize,
    },
    /// A state access failed.
    #[error(transparent)]
    State(#[from] StateError),
    /// A user interceptor failed the phase.
    #[error("interceptor failed: {0}")]
    Interceptor(String),
}

impl Error {
    /// Returns `true` for mistakes in the menu declaration or its handlers.
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::MissingRenderPayload { .. }
                | Self::MissingPosition { .. }
                | Self::SlotOutOfRange { .. }
                | Self::SlotCollision { .. }
                | Self::InvalidLayout { .. }
                | Self::LayoutOverflow { .. }
                | Self::DuplicateKey { .. }
        )
    }

    /// Returns `true` for container writes that bypassed the pipeline.
    #[must_use]
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Self::InventoryModification { .. })
    }

    /// Returns `true` for operations on sessions or components in the wrong state.
    #[must_use]
    pub fn is_session_state(&self) -> bool {
        matches!(
            self,
            Self::SessionAlreadyOpen { .. }
                | Self::SessionNotOpen { .. }
                | Self::UnknownComponent { .. }
                | Self::NotPaginated { .. }
                | Self::UnknownView
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;
    use coffer_state::StateId;

    #[test]
    fn classifiers_are_disjoint() {
        let errors = [
            Error::MissingPosition { key: "a".into() },
            Error::InventoryModification { slot: 3 },
            Error::SessionNotOpen {
                viewer: ViewerId(1),
            },
            Error::UpdateLoop { rounds: 32 },
        ];
        let classes: [(bool, bool, bool); 4] = errors.map(|e| {
            (
                e.is_configuration(),
                e.is_protocol_violation(),
                e.is_session_state(),
            )
        });
        assert_eq!(
            classes,
            [
                (true, false, false),
                (false, true, false),
                (false, false, true),
                (false, false, false),
            ]
        );
    }

    #[test]
    fn messages_name_the_culprit() {
        let err = Error::SlotCollision {
            key: "buy".into(),
            slot: 4,
            occupant: "sell".into(),
        };
        assert_eq!(
            err.to_string(),
            "component `buy` cannot move to slot 4, `sell` is shown there"
        );
        let err: Error = StateError::Unknown(StateId::new(2)).into();
        assert_eq!(err.to_string(), "state#2 does not belong to this store");
    }
}
