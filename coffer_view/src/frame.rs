// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The view host: registered views, shared states and open sessions.

use alloc::boxed::Box;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::any::Any;
use core::fmt;

use coffer_pipeline::Phase;
use coffer_state::{State, StateId, StateStore, StateValue};
use hashbrown::HashMap;
use tracing::{debug, trace, warn};

use crate::component::PageInfo;
use crate::config::DEFAULT_UPDATE_ROUNDS;
use crate::container::{Container, SlotGuard};
use crate::context::{
    ClickKind, CloseContext, Deferred, FirstRenderContext, OpenContext, Scope, SlotClickContext,
    Subject, UpdateReason,
};
use crate::error::{Error, Result};
use crate::id::{ComponentId, SessionId, ViewKey, ViewerId, Watcher};
use crate::pagination::{self, PageSwitch};
use crate::render::{self, RenderContext};
use crate::view::View;

/// What the platform should do after a click.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ClickOutcome {
    /// Suppress the native click action.
    pub cancelled: bool,
    /// The session was closed by the click.
    pub closed: bool,
    /// Key of the component shown at the clicked slot.
    pub component: Option<String>,
}

/// Hosts views and their sessions, and routes state changes to the components
/// that read them.
///
/// The frame is single-threaded: handlers run synchronously inside the
/// operation that triggered them, and every mutating operation ends with a
/// [`flush`](Self::flush) so watchers see a consistent store.
///
/// ```
/// use coffer_view::{ClickKind, Frame, ItemBuilder, MemoryContainer, View, ViewConfig, ViewerId};
///
/// let mut frame = Frame::<&str>::new();
/// let clicks = frame.state("clicks", 0_u32);
///
/// let mut view = View::new(ViewConfig::rows(1));
/// view.slot(
///     0,
///     ItemBuilder::new()
///         .key("counter")
///         .watch(clicks)
///         .render_with(move |ctx| {
///             let item = if *ctx.get(clicks) == 0 { "paper" } else { "book" };
///             ctx.set_item(item);
///         })
///         .on_click(move |ctx| ctx.update_state(clicks, |n| *n += 1)),
/// );
/// let menu = frame.register(view).unwrap();
///
/// let viewer = ViewerId(1);
/// frame.open(menu, viewer, MemoryContainer::new(9), ()).unwrap();
/// let outcome = frame.click(viewer, 0, ClickKind::Left).unwrap();
/// assert!(outcome.cancelled);
///
/// let container = frame.session(viewer).unwrap().container();
/// assert_eq!(container.slot_item(0), Some(&"book"));
/// ```
pub struct Frame<I> {
    views: Vec<View<I>>,
    states: StateStore<Watcher>,
    sessions: HashMap<ViewerId, RenderContext<I>>,
    by_session: HashMap<SessionId, ViewerId>,
    next_session: u64,
}

impl<I: Clone + 'static> Default for Frame<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> Frame<I> {
    /// The shared state store.
    #[must_use]
    pub fn states(&self) -> &StateStore<Watcher> {
        &self.states
    }

    /// Reads a state.
    ///
    /// # Panics
    ///
    /// Panics if `state` was not created by this frame.
    #[must_use]
    pub fn get<T: 'static>(&self, state: State<T>) -> &T {
        self.states.get(state)
    }

    /// A registered view.
    #[must_use]
    pub fn view(&self, key: ViewKey) -> Option<&View<I>> {
        self.views.get(key.idx())
    }

    /// The open session of `viewer`.
    #[must_use]
    pub fn session(&self, viewer: ViewerId) -> Option<&RenderContext<I>> {
        self.sessions.get(&viewer)
    }

    /// The open session of `viewer`, for platform code.
    pub fn session_mut(&mut self, viewer: ViewerId) -> Option<&mut RenderContext<I>> {
        self.sessions.get_mut(&viewer)
    }

    /// Returns `true` if `viewer` has an open session.
    #[must_use]
    pub fn is_open(&self, viewer: ViewerId) -> bool {
        self.sessions.contains_key(&viewer)
    }

    /// Number of open sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.len()
    }

    /// Session data of `viewer`, if it is a `T`.
    pub fn session_data<T: 'static>(&self, viewer: ViewerId) -> Result<Option<&T>> {
        Ok(self.open_session(viewer)?.data())
    }

    /// Replaces the session data of `viewer`.
    pub fn set_session_data<T: 'static>(&mut self, viewer: ViewerId, data: T) -> Result<()> {
        self.sessions
            .get_mut(&viewer)
            .ok_or(Error::SessionNotOpen { viewer })?
            .set_data(StateValue::new(data));
        Ok(())
    }

    fn open_session(&self, viewer: ViewerId) -> Result<&RenderContext<I>> {
        self.sessions
            .get(&viewer)
            .ok_or(Error::SessionNotOpen { viewer })
    }

    /// Smallest update round limit among the registered views.
    fn max_update_rounds(&self) -> usize {
        self.views
            .iter()
            .map(|view| view.config().max_update_rounds)
            .min()
            .unwrap_or(DEFAULT_UPDATE_ROUNDS)
    }
}

impl<I: Clone + 'static> Frame<I> {
    /// Creates an empty frame.
    #[must_use]
    pub fn new() -> Self {
        Self {
            views: Vec::new(),
            states: StateStore::new(),
            sessions: HashMap::new(),
            by_session: HashMap::new(),
            next_session: 1,
        }
    }

    /// Registers a view after validating its configuration.
    pub fn register(&mut self, view: View<I>) -> Result<ViewKey> {
        view.config().validate()?;
        let raw = u32::try_from(self.views.len()).map_err(|_| Error::InvalidLayout {
            reason: String::from("too many views"),
        })?;
        debug!(
            title = view.config().title.as_str(),
            components = view.builders().len(),
            "view registered"
        );
        self.views.push(view);
        Ok(ViewKey::new(raw))
    }

    /// Creates a state shared by every session of this frame.
    pub fn state<T: 'static>(&mut self, name: &'static str, initial: T) -> State<T> {
        self.states.create(name, initial)
    }

    /// Opens `view` for `viewer` on `container`.
    ///
    /// Runs the `on_open` hook, which may refuse the open, then instantiates the
    /// declared and per-session components and renders them. Returns `false`
    /// if the open was refused.
    pub fn open(
        &mut self,
        view: ViewKey,
        viewer: ViewerId,
        container: impl Container<I>,
        data: impl Any,
    ) -> Result<bool> {
        if self.sessions.contains_key(&viewer) {
            return Err(Error::SessionAlreadyOpen { viewer });
        }
        let definition = self.views.get(view.idx()).ok_or(Error::UnknownView)?;
        let size = definition.config().size;
        if container.slot_count() < size {
            return Err(Error::InvalidLayout {
                reason: format!(
                    "container has {} slots, the view needs {size}",
                    container.slot_count()
                ),
            });
        }

        let mut data = StateValue::new(data);
        if let Some(hook) = definition.on_open.clone() {
            let mut ctx = OpenContext {
                viewer,
                data: &mut data,
                states: &self.states,
                cancelled: false,
            };
            hook(&mut ctx);
            if ctx.cancelled {
                debug!(viewer = %viewer, "open refused");
                return Ok(false);
            }
        }

        let mut builders = definition.builders().to_vec();
        if let Some(hook) = definition.on_first_render.clone() {
            let mut ctx = FirstRenderContext {
                viewer,
                data: &data,
                states: &self.states,
                config: definition.config(),
                builders: &mut builders,
            };
            hook(&mut ctx);
        }

        let id = SessionId::new(self.next_session);
        self.next_session += 1;
        let guard = SlotGuard::new(Box::new(container));
        let mut session = RenderContext::new(id, viewer, view, guard, data, builders);
        session.instantiate_pending(&mut self.states, definition.config())?;
        render::render_roots(Scope::new(&mut session, &mut self.states, definition))?;

        debug!(viewer = %viewer, session = id.get(), "session opened");
        self.sessions.insert(viewer, session);
        self.by_session.insert(id, viewer);
        self.flush()?;
        Ok(true)
    }

    /// Closes the session of `viewer` and hands back its container.
    ///
    /// Visible components are cleared first, then the container is told to
    /// close and the `on_close` hook runs. The session ends even if clearing
    /// fails: the container still closes, the hook still runs, and the first
    /// error is returned.
    pub fn close(&mut self, viewer: ViewerId) -> Result<Box<dyn Container<I>>> {
        let mut session = self
            .sessions
            .remove(&viewer)
            .ok_or(Error::SessionNotOpen { viewer })?;
        self.by_session.remove(&session.id());
        let view = self
            .views
            .get(session.view_key().idx())
            .ok_or(Error::UnknownView)?;

        let cleared = render::clear_roots(Scope::new(&mut session, &mut self.states, view));
        if let Err(err) = &cleared {
            warn!(viewer = %viewer, error = %err, "clearing a closing session failed");
        }
        session.container.close();
        if let Some(hook) = view.on_close.clone() {
            let mut ctx = CloseContext {
                viewer,
                data: session.data_value(),
                states: &mut self.states,
            };
            hook(&mut ctx);
        }
        debug!(viewer = %viewer, session = session.id().get(), "session closed");

        let container = session.into_container();
        let flushed = self.flush();
        cleared?;
        flushed?;
        Ok(container)
    }

    /// Routes a click on `slot` through the CLICK phase.
    ///
    /// Updates and page switches requested by click handlers run after the
    /// phase; a close request closes the session exactly once, after them.
    pub fn click(&mut self, viewer: ViewerId, slot: usize, kind: ClickKind) -> Result<ClickOutcome> {
        let session = self
            .sessions
            .get_mut(&viewer)
            .ok_or(Error::SessionNotOpen { viewer })?;
        let view = self
            .views
            .get(session.view_key().idx())
            .ok_or(Error::UnknownView)?;
        let component = session.occupant(slot);
        trace!(viewer = %viewer, slot, ?kind, key = ?component.map(|id| session.key_of(id)), "click");

        let scope = Scope::new(session, &mut self.states, view);
        let mut subject = Subject::Click(SlotClickContext::new(scope, slot, kind, component));
        render::dispatch(view, Phase::Click, &mut subject)?;
        let Subject::Click(ctx) = subject else {
            unreachable!("interceptors cannot replace the subject");
        };
        let outcome = ClickOutcome {
            cancelled: ctx.cancel.unwrap_or(view.config().cancel_on_click),
            closed: ctx.close,
            component: ctx.component().map(|c| String::from(c.key())),
        };
        let deferred = ctx.deferred;

        if !outcome.closed {
            for action in deferred {
                match action {
                    Deferred::Update(id) => self.update_id(viewer, id)?,
                    Deferred::Page(key, switch) => {
                        self.paginate(viewer, &key, switch)?;
                    }
                }
            }
        }
        if outcome.closed {
            self.close(viewer)?;
        } else {
            self.flush()?;
        }
        Ok(outcome)
    }

    fn update_id(&mut self, viewer: ViewerId, id: ComponentId) -> Result<()> {
        self.with_scope(viewer, |scope| {
            if !scope.session.contains(id) {
                return Ok(());
            }
            render::update_component(scope, id, true, UpdateReason::Click)
        })
    }

    fn with_scope<R>(
        &mut self,
        viewer: ViewerId,
        f: impl FnOnce(Scope<'_, I>) -> Result<R>,
    ) -> Result<R> {
        let session = self
            .sessions
            .get_mut(&viewer)
            .ok_or(Error::SessionNotOpen { viewer })?;
        let view = self
            .views
            .get(session.view_key().idx())
            .ok_or(Error::UnknownView)?;
        f(Scope::new(session, &mut self.states, view))
    }

    fn with_component(
        &mut self,
        viewer: ViewerId,
        key: &str,
        f: impl FnOnce(Scope<'_, I>, ComponentId) -> Result<()>,
    ) -> Result<()> {
        self.with_scope(viewer, |scope| {
            let id = scope.session.resolve(key)?;
            f(scope, id)
        })?;
        self.flush()?;
        Ok(())
    }

    /// Renders the component `key` if its display predicate allows it.
    pub fn render(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, |scope, id| {
            render::render_component(scope, id).map(drop)
        })
    }

    /// Makes the component `key` visible and renders it.
    pub fn show(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, render::show)
    }

    /// Hides the component `key` and clears its slots.
    ///
    /// The component stays hidden through state changes and updates until
    /// [`show`](Self::show).
    pub fn hide(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, render::hide)
    }

    /// Updates the component `key`. Static items are left alone.
    pub fn update(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, |scope, id| {
            render::update_component(scope, id, false, UpdateReason::User("update"))
        })
    }

    /// Updates the component `key`, static items included.
    pub fn force_update(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, |scope, id| {
            render::update_component(scope, id, true, UpdateReason::Forced)
        })
    }

    /// Clears the slots of the component `key` without hiding it.
    pub fn clear(&mut self, viewer: ViewerId, key: &str) -> Result<()> {
        self.with_component(viewer, key, render::clear_component)
    }

    /// Moves the pagination `key` and shows the resulting page.
    pub fn paginate(&mut self, viewer: ViewerId, key: &str, switch: PageSwitch) -> Result<PageInfo> {
        let info = self.with_scope(viewer, |scope| {
            let id = scope.session.resolve(key)?;
            pagination::switch(scope, id, switch)
        })?;
        debug!(viewer = %viewer, key, page = info.page, pages = info.page_count, "page switched");
        self.flush()?;
        Ok(info)
    }

    /// Replaces a state's value and updates every component watching it.
    pub fn set_state<T: 'static>(&mut self, state: State<T>, value: T) -> Result<()> {
        self.states.try_set(state, value)?;
        self.flush()?;
        Ok(())
    }

    /// Mutates a state in place and updates every component watching it.
    pub fn update_state<T: 'static>(
        &mut self,
        state: State<T>,
        f: impl FnOnce(&mut T),
    ) -> Result<()> {
        self.states.try_update(state, f)?;
        self.flush()?;
        Ok(())
    }

    /// Marks a state changed without touching its value.
    pub fn touch(&mut self, state: StateId) -> Result<()> {
        self.states
            .touch(state)
            .ok_or(coffer_state::StateError::Unknown(state))?;
        self.flush()?;
        Ok(())
    }

    /// Applies several state changes, then updates each affected component
    /// once.
    pub fn batch(&mut self, f: impl FnOnce(&mut StateStore<Watcher>)) -> Result<()> {
        f(&mut self.states);
        self.flush()?;
        Ok(())
    }

    /// Delivers pending state changes until none are left.
    ///
    /// Each round takes the pending batch, and a component updates at most
    /// once per round: a group and a child watching the same state do not
    /// update the child twice. Updates may change states again, which starts
    /// another round. Returns the number of component updates.
    ///
    /// A failed update does not stop its round. The remaining watchers are
    /// still updated, later rounds still run, and the first error is returned
    /// once the changes settle.
    ///
    /// After [`ViewConfig::max_update_rounds`](crate::ViewConfig::max_update_rounds)
    /// rounds the pending changes are dropped and [`Error::UpdateLoop`] is
    /// returned.
    pub fn flush(&mut self) -> Result<usize> {
        let max = self.max_update_rounds();
        let mut rounds = 0;
        let mut updated = 0;
        let mut failure = None;
        while self.states.has_pending() {
            if rounds == max {
                let dropped = self.states.take_pending();
                warn!(rounds, dropped = dropped.len(), "state updates did not settle");
                return Err(Error::UpdateLoop { rounds });
            }
            rounds += 1;
            let batch = self.states.take_pending();
            debug!(round = rounds, watchers = batch.len(), "flush round");

            for session in self.sessions.values_mut() {
                session.begin_round();
            }
            let mut stale = false;
            for &watcher in batch.watchers() {
                match self.deliver(watcher, batch.changed_states()) {
                    Ok(Delivery::Updated) => updated += 1,
                    Ok(Delivery::Skipped) => {}
                    Ok(Delivery::Stale) => stale = true,
                    Err(err) => {
                        warn!(round = rounds, error = %err, "state update failed");
                        if failure.is_none() {
                            failure = Some(err);
                        }
                    }
                }
            }
            for session in self.sessions.values_mut() {
                session.end_round();
            }
            if stale {
                self.prune(batch.changed_states());
            }
        }
        match failure {
            Some(err) => Err(err),
            None => Ok(updated),
        }
    }

    fn deliver(&mut self, watcher: Watcher, changed: &[StateId]) -> Result<Delivery> {
        let Some(&viewer) = self.by_session.get(&watcher.session) else {
            return Ok(Delivery::Stale);
        };
        let Some(session) = self.sessions.get_mut(&viewer) else {
            return Ok(Delivery::Stale);
        };
        let Some(component) = session.get(watcher.component) else {
            return Ok(Delivery::Stale);
        };
        if component.is_hidden() || session.updated_this_round(watcher.component) {
            return Ok(Delivery::Skipped);
        }
        let reason = changed
            .iter()
            .copied()
            .find(|state| component.watching().contains(state))
            .map_or(UpdateReason::Forced, UpdateReason::StateChanged);

        // Components inside a hidden group wait for the group to show again.
        let mut parent = component.parent();
        while let Some(id) = parent {
            match session.get(id) {
                Some(ancestor) if ancestor.is_visible() => parent = ancestor.parent(),
                _ => return Ok(Delivery::Skipped),
            }
        }

        let view = self
            .views
            .get(session.view_key().idx())
            .ok_or(Error::UnknownView)?;
        render::update_component(
            Scope::new(session, &mut self.states, view),
            watcher.component,
            false,
            reason,
        )?;
        Ok(Delivery::Updated)
    }

    fn prune(&mut self, changed: &[StateId]) {
        let (sessions, by_session) = (&self.sessions, &self.by_session);
        let live = |watcher: Watcher| {
            by_session
                .get(&watcher.session)
                .and_then(|viewer| sessions.get(viewer))
                .is_some_and(|session| session.contains(watcher.component))
        };
        for &state in changed {
            let pruned = self.states.retain_watchers(state, live);
            if pruned > 0 {
                debug!(state = %state, pruned, "stale watchers pruned");
            }
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Delivery {
    Updated,
    Skipped,
    Stale,
}

impl<I> fmt::Debug for Frame<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("views", &self.views.len())
            .field("states", &self.states.len())
            .field("sessions", &self.sessions.len())
            .finish_non_exhaustive()
    }
}
