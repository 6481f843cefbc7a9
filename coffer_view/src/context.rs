// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-operation context objects.
//!
//! Every lifecycle operation wraps its inputs in a context that lives for one
//! pipeline pass. Component contexts borrow the session, the shared states and
//! the view definition for that pass; the four of them are the possible
//! pipeline [`Subject`]s.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use coffer_pipeline::Phase;
use coffer_state::{State, StateError, StateId, StateStore, StateValue};
use smallvec::SmallVec;

use crate::builder::{ComponentBuilder, ItemBuilder, Placement};
use crate::component::{Component, PageInfo};
use crate::config::ViewConfig;
use crate::pagination::PageSwitch;
use crate::id::{ComponentId, ViewerId, Watcher};
use crate::render::RenderContext;
use crate::view::View;

/// Why a component is being updated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UpdateReason {
    /// A watched state changed.
    StateChanged(StateId),
    /// The component was clicked with update-on-click.
    Click,
    /// Somebody asked for it explicitly.
    Forced,
    /// The component's pagination moved to another page.
    PageSwitch,
    /// An application-defined reason.
    User(&'static str),
}

/// How a slot was clicked, as reported by the platform.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ClickKind {
    /// Primary button.
    #[default]
    Left,
    /// Secondary button.
    Right,
    /// Middle button.
    Middle,
    /// Primary button with shift held.
    ShiftLeft,
    /// Secondary button with shift held.
    ShiftRight,
    /// Anything else the platform distinguishes.
    Other,
}

/// Everything a component operation may touch.
pub(crate) struct Scope<'a, I> {
    pub(crate) session: &'a mut RenderContext<I>,
    pub(crate) states: &'a mut StateStore<Watcher>,
    pub(crate) view: &'a View<I>,
}

impl<'a, I> Scope<'a, I> {
    pub(crate) fn new(
        session: &'a mut RenderContext<I>,
        states: &'a mut StateStore<Watcher>,
        view: &'a View<I>,
    ) -> Self {
        Self {
            session,
            states,
            view,
        }
    }

    /// A shorter-lived scope for a nested operation.
    pub(crate) fn reborrow(&mut self) -> Scope<'_, I> {
        Scope {
            session: &mut *self.session,
            states: &mut *self.states,
            view: self.view,
        }
    }

    pub(crate) fn display(&self) -> DisplayContext<'_, I> {
        DisplayContext {
            session: &*self.session,
            states: &*self.states,
        }
    }
}

/// Read-only view of a session, given to display predicates and pagination
/// providers.
pub struct DisplayContext<'a, I> {
    session: &'a RenderContext<I>,
    states: &'a StateStore<Watcher>,
}

impl<'a, I> DisplayContext<'a, I> {
    pub(crate) fn new(session: &'a RenderContext<I>, states: &'a StateStore<Watcher>) -> Self {
        Self { session, states }
    }

    /// The viewer of the session.
    #[must_use]
    pub fn viewer(&self) -> ViewerId {
        self.session.viewer()
    }

    /// The session.
    #[must_use]
    pub fn session(&self) -> &RenderContext<I> {
        self.session
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not belong to the frame's store.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        self.states.get(state)
    }

    /// Reads a state.
    pub fn try_get<T: 'static>(&self, state: State<T>) -> Result<&T, StateError> {
        self.states.try_get(state)
    }

    /// Session data, if it is a `T`.
    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.session.data()
    }
}

impl<I> fmt::Debug for DisplayContext<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayContext")
            .field("viewer", &self.session.viewer())
            .finish_non_exhaustive()
    }
}

/// Accessors shared by the component contexts.
macro_rules! session_accessors {
    ($name:ident) => {
        impl<I: 'static> $name<'_, I> {
            /// The viewer of the session.
            #[must_use]
            pub fn viewer(&self) -> ViewerId {
                self.scope.session.viewer()
            }

            /// The session.
            #[must_use]
            pub fn session(&self) -> &RenderContext<I> {
                &*self.scope.session
            }

            /// Reads a state.
            ///
            /// # Panics
            ///
            /// Panics if `state` does not belong to the frame's store.
            #[must_use]
            pub fn get<T: 'static>(&self, state: State<T>) -> &T {
                self.scope.states.get(state)
            }

            /// Replaces a state's value. Its watchers update once the
            /// operation that created this context has finished.
            ///
            /// # Panics
            ///
            /// Panics if `state` does not belong to the frame's store.
            pub fn set<T: 'static>(&mut self, state: State<T>, value: T) {
                self.scope.states.set(state, value);
            }

            /// Mutates a state in place, see [`set`](Self::set).
            ///
            /// # Panics
            ///
            /// Panics if `state` does not belong to the frame's store.
            pub fn update_state<T: 'static>(&mut self, state: State<T>, f: impl FnOnce(&mut T)) {
                self.scope.states.update(state, f);
            }

            /// Session data, if it is a `T`.
            #[must_use]
            pub fn data<T: 'static>(&self) -> Option<&T> {
                self.scope.session.data()
            }

            /// Mutable session data, if it is a `T`.
            pub fn data_mut<T: 'static>(&mut self) -> Option<&mut T> {
                self.scope.session.data_mut()
            }
        }
    };
}

/// Subject of a RENDER pass: one component being written to the container.
pub struct ComponentRenderContext<'a, I> {
    pub(crate) scope: Scope<'a, I>,
    pub(crate) component: ComponentId,
    pub(crate) result: Option<I>,
}

impl<'a, I> ComponentRenderContext<'a, I> {
    pub(crate) fn new(scope: Scope<'a, I>, component: ComponentId) -> Self {
        Self {
            scope,
            component,
            result: None,
        }
    }
}

impl<I: 'static> ComponentRenderContext<'_, I> {
    /// The component being rendered.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.component
    }

    /// The record of the component being rendered.
    #[must_use]
    pub fn component(&self) -> Option<&Component<I>> {
        self.scope.session.get(self.component)
    }

    /// The slot the component is bound to.
    #[must_use]
    pub fn slot(&self) -> Option<usize> {
        self.component().and_then(Component::position)
    }

    /// Binds the component to `slot`.
    ///
    /// Moving an already placed item clears its previous slot.
    pub fn set_slot(&mut self, slot: usize) {
        if let Some(component) = self.scope.session.get_mut(self.component) {
            component.position = Some(slot);
        }
    }

    /// Sets the item to show, instead of the static one.
    pub fn set_item(&mut self, item: I) {
        self.result = Some(item);
    }

    /// The item set by [`set_item`](Self::set_item) so far.
    #[must_use]
    pub fn result(&self) -> Option<&I> {
        self.result.as_ref()
    }
}

session_accessors!(ComponentRenderContext);

/// Subject of an UPDATE pass.
pub struct ComponentUpdateContext<'a, I> {
    pub(crate) scope: Scope<'a, I>,
    pub(crate) component: ComponentId,
    pub(crate) force: bool,
    pub(crate) reason: UpdateReason,
    pub(crate) cancelled: bool,
}

impl<'a, I> ComponentUpdateContext<'a, I> {
    pub(crate) fn new(
        scope: Scope<'a, I>,
        component: ComponentId,
        force: bool,
        reason: UpdateReason,
    ) -> Self {
        Self {
            scope,
            component,
            force,
            reason,
            cancelled: false,
        }
    }
}

impl<I: 'static> ComponentUpdateContext<'_, I> {
    /// The component being updated.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.component
    }

    /// The record of the component being updated.
    #[must_use]
    pub fn component(&self) -> Option<&Component<I>> {
        self.scope.session.get(self.component)
    }

    /// Returns `true` if the update bypasses the static-component shortcut.
    #[must_use]
    pub fn is_forced(&self) -> bool {
        self.force
    }

    /// Why the update happens.
    #[must_use]
    pub fn reason(&self) -> &UpdateReason {
        &self.reason
    }

    /// Stops the update; the component is not re-rendered.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    /// Replaces the component's static item. The re-render that follows
    /// shows it.
    pub fn set_item(&mut self, item: I) {
        if let Some(component) = self.scope.session.get_mut(self.component) {
            component.item = Some(item);
        }
    }

    /// Page position, when the component is a pagination.
    #[must_use]
    pub fn page(&self) -> Option<PageInfo> {
        self.component().and_then(Component::page)
    }
}

session_accessors!(ComponentUpdateContext);

/// Work a click handler asks for, run after the CLICK pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum Deferred {
    Update(ComponentId),
    Page(String, PageSwitch),
}

/// Subject of a CLICK pass.
///
/// Cancellation and closing are intents: the platform honors
/// [`ClickOutcome`](crate::ClickOutcome), and the frame closes the session once
/// the pass ends.
pub struct SlotClickContext<'a, I> {
    pub(crate) scope: Scope<'a, I>,
    pub(crate) slot: usize,
    pub(crate) kind: ClickKind,
    pub(crate) component: Option<ComponentId>,
    pub(crate) cancel: Option<bool>,
    pub(crate) close: bool,
    pub(crate) deferred: SmallVec<[Deferred; 2]>,
}

impl<'a, I> SlotClickContext<'a, I> {
    pub(crate) fn new(
        scope: Scope<'a, I>,
        slot: usize,
        kind: ClickKind,
        component: Option<ComponentId>,
    ) -> Self {
        Self {
            scope,
            slot,
            kind,
            component,
            cancel: None,
            close: false,
            deferred: SmallVec::new(),
        }
    }
}

impl<I: 'static> SlotClickContext<'_, I> {
    /// The clicked slot.
    #[must_use]
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// How the slot was clicked.
    #[must_use]
    pub fn kind(&self) -> ClickKind {
        self.kind
    }

    /// The component shown at the clicked slot.
    #[must_use]
    pub fn id(&self) -> Option<ComponentId> {
        self.component
    }

    /// The record of the component shown at the clicked slot.
    #[must_use]
    pub fn component(&self) -> Option<&Component<I>> {
        self.component.and_then(|id| self.scope.session.get(id))
    }

    /// Asks the platform to cancel the native click.
    pub fn cancel(&mut self) {
        self.cancel = Some(true);
    }

    /// Decides the click cancellation either way.
    pub fn set_cancelled(&mut self, cancelled: bool) {
        self.cancel = Some(cancelled);
    }

    /// Returns `true` if the click will be cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.unwrap_or(false)
    }

    /// The cancellation decided so far; `None` while nobody decided.
    #[must_use]
    pub fn cancel_intent(&self) -> Option<bool> {
        self.cancel
    }

    /// Closes the session after this click.
    pub fn close(&mut self) {
        self.close = true;
    }

    /// Returns `true` if the session closes after this click.
    #[must_use]
    pub fn is_close_requested(&self) -> bool {
        self.close
    }

    /// Force-updates the clicked component after this click.
    pub fn update(&mut self) {
        if let Some(id) = self.component {
            let request = Deferred::Update(id);
            if !self.deferred.contains(&request) {
                self.deferred.push(request);
            }
        }
    }

    /// Moves the pagination `key` after this click.
    pub fn switch_page(&mut self, key: impl Into<String>, switch: PageSwitch) {
        self.deferred.push(Deferred::Page(key.into(), switch));
    }
}

session_accessors!(SlotClickContext);

/// Subject of a CLEAR pass.
pub struct ComponentClearContext<'a, I> {
    pub(crate) scope: Scope<'a, I>,
    pub(crate) component: ComponentId,
}

impl<'a, I> ComponentClearContext<'a, I> {
    pub(crate) fn new(scope: Scope<'a, I>, component: ComponentId) -> Self {
        Self { scope, component }
    }
}

impl<I: 'static> ComponentClearContext<'_, I> {
    /// The component being cleared.
    #[must_use]
    pub fn id(&self) -> ComponentId {
        self.component
    }

    /// The record of the component being cleared.
    #[must_use]
    pub fn component(&self) -> Option<&Component<I>> {
        self.scope.session.get(self.component)
    }
}

session_accessors!(ComponentClearContext);

/// The value a pipeline phase runs against.
pub enum Subject<'a, I> {
    /// A RENDER pass.
    Render(ComponentRenderContext<'a, I>),
    /// An UPDATE pass.
    Update(ComponentUpdateContext<'a, I>),
    /// A CLICK pass.
    Click(SlotClickContext<'a, I>),
    /// A CLEAR pass.
    Clear(ComponentClearContext<'a, I>),
}

impl<'a, I> Subject<'a, I> {
    /// The phase this subject belongs to.
    #[must_use]
    pub fn phase(&self) -> Phase {
        match self {
            Self::Render(_) => Phase::Render,
            Self::Update(_) => Phase::Update,
            Self::Click(_) => Phase::Click,
            Self::Clear(_) => Phase::Clear,
        }
    }

    /// The component the pass is about, if any.
    #[must_use]
    pub fn component_id(&self) -> Option<ComponentId> {
        match self {
            Self::Render(ctx) => Some(ctx.component),
            Self::Update(ctx) => Some(ctx.component),
            Self::Click(ctx) => ctx.component,
            Self::Clear(ctx) => Some(ctx.component),
        }
    }

    pub(crate) fn scope_mut(&mut self) -> &mut Scope<'a, I> {
        match self {
            Self::Render(ctx) => &mut ctx.scope,
            Self::Update(ctx) => &mut ctx.scope,
            Self::Click(ctx) => &mut ctx.scope,
            Self::Clear(ctx) => &mut ctx.scope,
        }
    }

    fn scope(&self) -> &Scope<'a, I> {
        match self {
            Self::Render(ctx) => &ctx.scope,
            Self::Update(ctx) => &ctx.scope,
            Self::Click(ctx) => &ctx.scope,
            Self::Clear(ctx) => &ctx.scope,
        }
    }

    /// The session the pass runs in.
    #[must_use]
    pub fn session(&self) -> &RenderContext<I> {
        &*self.scope().session
    }
}

macro_rules! debug_component_context {
    ($name:ident) => {
        impl<I> fmt::Debug for $name<'_, I> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($name))
                    .field("viewer", &self.scope.session.viewer())
                    .field("component", &self.component)
                    .finish_non_exhaustive()
            }
        }
    };
}

debug_component_context!(ComponentRenderContext);
debug_component_context!(ComponentUpdateContext);
debug_component_context!(SlotClickContext);
debug_component_context!(ComponentClearContext);

impl<I> fmt::Debug for Subject<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Render(ctx) => ctx.fmt(f),
            Self::Update(ctx) => ctx.fmt(f),
            Self::Click(ctx) => ctx.fmt(f),
            Self::Clear(ctx) => ctx.fmt(f),
        }
    }
}

/// Context of the `on_open` hook, before any component exists.
pub struct OpenContext<'a> {
    pub(crate) viewer: ViewerId,
    pub(crate) data: &'a mut StateValue,
    pub(crate) states: &'a StateStore<Watcher>,
    pub(crate) cancelled: bool,
}

impl OpenContext<'_> {
    /// The viewer opening the view.
    #[must_use]
    pub fn viewer(&self) -> ViewerId {
        self.viewer
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not belong to the frame's store.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        self.states.get(state)
    }

    /// The data passed to [`Frame::open`](crate::Frame::open), if it is a `T`.
    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// Replaces the session data.
    pub fn set_data<T: 'static>(&mut self, data: T) {
        *self.data = StateValue::new(data);
    }

    /// Refuses to open the view.
    pub fn cancel(&mut self) {
        self.cancelled = true;
    }

    /// Returns `true` once [`cancel`](Self::cancel) was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }
}

impl fmt::Debug for OpenContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenContext")
            .field("viewer", &self.viewer)
            .field("cancelled", &self.cancelled)
            .finish_non_exhaustive()
    }
}

/// Context of the `on_first_render` hook, where per-session components are
/// declared.
pub struct FirstRenderContext<'a, I> {
    pub(crate) viewer: ViewerId,
    pub(crate) data: &'a StateValue,
    pub(crate) states: &'a StateStore<Watcher>,
    pub(crate) config: &'a ViewConfig,
    pub(crate) builders: &'a mut Vec<ComponentBuilder<I>>,
}

impl<I> FirstRenderContext<'_, I> {
    /// The viewer.
    #[must_use]
    pub fn viewer(&self) -> ViewerId {
        self.viewer
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not belong to the frame's store.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        self.states.get(state)
    }

    /// Session data, if it is a `T`.
    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// The view configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        self.config
    }

    /// Declares a component for this session only.
    pub fn add(&mut self, builder: impl Into<ComponentBuilder<I>>) -> &mut Self {
        self.builders.push(builder.into());
        self
    }

    /// Declares an item at `slot` for this session only.
    pub fn slot(&mut self, slot: usize, item: ItemBuilder<I>) -> &mut Self {
        self.add(item.placed(Placement::Fixed(slot)))
    }

    /// Declares an item in the next available slot for this session only.
    pub fn available_slot(&mut self, item: ItemBuilder<I>) -> &mut Self {
        self.add(item.placed(Placement::NextAvailable))
    }
}

impl<I> fmt::Debug for FirstRenderContext<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FirstRenderContext")
            .field("viewer", &self.viewer)
            .field("declared", &self.builders.len())
            .finish_non_exhaustive()
    }
}

/// Context of the `on_close` hook, after the components were cleared.
pub struct CloseContext<'a> {
    pub(crate) viewer: ViewerId,
    pub(crate) data: &'a mut StateValue,
    pub(crate) states: &'a mut StateStore<Watcher>,
}

impl CloseContext<'_> {
    /// The viewer that closed the view.
    #[must_use]
    pub fn viewer(&self) -> ViewerId {
        self.viewer
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not belong to the frame's store.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        self.states.get(state)
    }

    /// Replaces a state's value; other sessions update afterwards.
    ///
    /// # Panics
    ///
    /// Panics if `state` does not belong to the frame's store.
    pub fn set<T: 'static>(&mut self, state: State<T>, value: T) {
        self.states.set(state, value);
    }

    /// Session data, if it is a `T`.
    #[must_use]
    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.data.downcast_ref()
    }

    /// Mutable session data, if it is a `T`.
    pub fn data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.data.downcast_mut()
    }
}

impl fmt::Debug for CloseContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloseContext")
            .field("viewer", &self.viewer)
            .finish_non_exhaustive()
    }
}
