// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Sessions and slot reconciliation.

use alloc::format;
use alloc::string::String;
use alloc::vec;
use alloc::vec::Vec;
use core::fmt;

use coffer_pipeline::{Outcome, Phase};
use coffer_state::{StateStore, StateValue};
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;
use tracing::{debug, trace};

use crate::builder::{ComponentBuilder, ItemBuilder, PageTarget, Placement};
use crate::component::{Component, ComponentFlags, ComponentKind, PageState, Source};
use crate::config::{AVAILABLE_SLOT, ViewConfig};
use crate::container::{Container, SlotGuard};
use crate::context::{
    ComponentClearContext, ComponentRenderContext, ComponentUpdateContext, Scope, Subject,
    UpdateReason,
};
use crate::error::{Error, Result};
use crate::id::{ComponentId, SessionId, ViewKey, ViewerId, Watcher};
use crate::view::View;

/// One open (view, viewer) session.
///
/// Owns the session's component records, the authoritative slot → component
/// map and the guarded container. All slot writes go through a pipeline phase
/// of this session, so the map always knows what a slot shows.
///
/// Sessions are created by [`Frame::open`](crate::Frame::open) and dropped when
/// the viewer closes the view.
pub struct RenderContext<I> {
    id: SessionId,
    viewer: ViewerId,
    view: ViewKey,
    pub(crate) container: SlotGuard<I>,
    arena: crate::arena::Arena<I>,
    keys: HashMap<String, ComponentId>,
    roots: Vec<ComponentId>,
    occupants: Vec<Option<ComponentId>>,
    pending: Vec<ComponentBuilder<I>>,
    data: StateValue,
    rendered: bool,
    /// Components updated in the running flush round, while one runs.
    round: HashSet<ComponentId>,
    in_round: bool,
}

impl<I> RenderContext<I> {
    /// Session id.
    #[must_use]
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// The viewer looking at this session.
    #[must_use]
    pub fn viewer(&self) -> ViewerId {
        self.viewer
    }

    pub(crate) fn view_key(&self) -> ViewKey {
        self.view
    }

    /// Returns `true` once the first render pass completed.
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.rendered
    }

    /// The record of a live component.
    #[must_use]
    pub fn get(&self, id: ComponentId) -> Option<&Component<I>> {
        self.arena.get(id)
    }

    pub(crate) fn get_mut(&mut self, id: ComponentId) -> Option<&mut Component<I>> {
        self.arena.get_mut(id)
    }

    pub(crate) fn record(&self, id: ComponentId) -> Result<&Component<I>> {
        self.arena.get(id).ok_or_else(|| stale(id))
    }

    pub(crate) fn record_mut(&mut self, id: ComponentId) -> Result<&mut Component<I>> {
        self.arena.get_mut(id).ok_or_else(|| stale(id))
    }

    /// Returns `true` if `id` names a live component.
    #[must_use]
    pub fn contains(&self, id: ComponentId) -> bool {
        self.arena.contains(id)
    }

    /// The id of the component with this key.
    #[must_use]
    pub fn component_id(&self, key: &str) -> Option<ComponentId> {
        self.keys.get(key).copied()
    }

    /// The component with this key.
    #[must_use]
    pub fn component(&self, key: &str) -> Option<&Component<I>> {
        self.component_id(key).and_then(|id| self.arena.get(id))
    }

    pub(crate) fn resolve(&self, key: &str) -> Result<ComponentId> {
        self.component_id(key).ok_or_else(|| Error::UnknownComponent {
            key: String::from(key),
        })
    }

    /// Top-level components, in declaration order.
    #[must_use]
    pub fn roots(&self) -> &[ComponentId] {
        &self.roots
    }

    /// Every live component, in arena order.
    pub fn components(&self) -> impl Iterator<Item = (ComponentId, &Component<I>)> + '_ {
        self.arena.iter()
    }

    /// Number of live components.
    #[must_use]
    pub fn len(&self) -> usize {
        self.arena.len()
    }

    /// Returns `true` if the session has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.arena.len() == 0
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

    pub(crate) fn set_data(&mut self, data: StateValue) {
        self.data = data;
    }

    pub(crate) fn data_value(&mut self) -> &mut StateValue {
        &mut self.data
    }

    /// The component last written to `slot`, if it is still shown there.
    #[must_use]
    pub fn component_at(&self, slot: usize) -> Option<&Component<I>> {
        let id = self.occupant(slot)?;
        self.arena.get(id)
    }

    pub(crate) fn occupant(&self, slot: usize) -> Option<ComponentId> {
        let id = (*self.occupants.get(slot)?)?;
        let component = self.arena.get(id)?;
        (component.is_visible() && component.position == Some(slot)).then_some(id)
    }

    /// Returns `true` if `id`, or any item below it, is bound to `slot`.
    #[must_use]
    pub fn is_contained_within(&self, id: ComponentId, slot: usize) -> bool {
        let Some(component) = self.arena.get(id) else {
            return false;
        };
        component.is_contained_within(slot)
            || component
                .children
                .iter()
                .any(|&child| self.is_contained_within(child, slot))
    }

    /// Returns `true` if `a` and `b` share at least one slot.
    #[must_use]
    pub fn intersects(&self, a: ComponentId, b: ComponentId) -> bool {
        let mut slots = SmallVec::<[usize; 8]>::new();
        self.collect_slots(a, &mut slots);
        slots.iter().any(|&slot| self.is_contained_within(b, slot))
    }

    fn collect_slots(&self, id: ComponentId, out: &mut SmallVec<[usize; 8]>) {
        let Some(component) = self.arena.get(id) else {
            return;
        };
        if component.kind == ComponentKind::Item {
            out.extend(component.position);
        }
        for &child in &component.children {
            self.collect_slots(child, out);
        }
    }

    pub(crate) fn children_of(&self, id: ComponentId) -> Vec<ComponentId> {
        self.arena
            .get(id)
            .map(|c| c.children.clone())
            .unwrap_or_default()
    }

    /// Starts recording updates for one flush round.
    pub(crate) fn begin_round(&mut self) {
        self.round.clear();
        self.in_round = true;
    }

    pub(crate) fn end_round(&mut self) {
        self.round.clear();
        self.in_round = false;
    }

    /// Records an update of `id`. Returns `false` if `id` was already updated
    /// in the running flush round.
    pub(crate) fn note_update(&mut self, id: ComponentId) -> bool {
        !self.in_round || self.round.insert(id)
    }

    /// Counts a render of `id` as its update for the running flush round.
    fn mark_updated(&mut self, id: ComponentId) {
        if self.in_round {
            self.round.insert(id);
        }
    }

    pub(crate) fn updated_this_round(&self, id: ComponentId) -> bool {
        self.in_round && self.round.contains(&id)
    }

    /// The key of a component, for logs.
    pub(crate) fn key_of(&self, id: ComponentId) -> &str {
        self.arena.get(id).map_or("<stale>", |c| c.key.as_str())
    }

    /// Frees a component and everything below it.
    ///
    /// Watchers that still point at the freed ids stop resolving and are
    /// pruned the next time their state changes.
    pub(crate) fn free(&mut self, id: ComponentId) {
        let Some(component) = self.arena.remove(id) else {
            return;
        };
        if self.keys.get(component.key.as_str()) == Some(&id) {
            self.keys.remove(component.key.as_str());
        }
        for occupant in &mut self.occupants {
            if *occupant == Some(id) {
                *occupant = None;
            }
        }
        for child in component.children {
            self.free(child);
        }
    }
}

impl<I: Clone + 'static> RenderContext<I> {
    pub(crate) fn new(
        id: SessionId,
        viewer: ViewerId,
        view: ViewKey,
        container: SlotGuard<I>,
        data: StateValue,
        pending: Vec<ComponentBuilder<I>>,
    ) -> Self {
        let slots = container.slot_count();
        Self {
            id,
            viewer,
            view,
            container,
            arena: crate::arena::Arena::new(),
            keys: HashMap::new(),
            roots: Vec::new(),
            occupants: vec![None; slots],
            pending,
            data,
            rendered: false,
            round: HashSet::new(),
            in_round: false,
        }
    }

    /// The session's container.
    #[must_use]
    pub fn container(&self) -> &SlotGuard<I> {
        &self.container
    }

    /// The session's container, for platform code.
    ///
    /// Writes through it fail with [`Error::InventoryModification`] outside of
    /// a pipeline phase.
    pub fn container_mut(&mut self) -> &mut SlotGuard<I> {
        &mut self.container
    }

    /// Shows `item` at `slot` on behalf of `id`.
    pub(crate) fn write(&mut self, id: ComponentId, slot: usize, item: I) -> Result<()> {
        self.container.set(slot, item)?;
        if let Some(occupant) = self.occupants.get_mut(slot) {
            *occupant = Some(id);
        }
        Ok(())
    }

    /// Empties `slot` on behalf of `id`, unless another live component was
    /// written there since.
    pub(crate) fn erase(&mut self, id: ComponentId, slot: usize) -> Result<()> {
        if let Some(Some(other)) = self.occupants.get(slot)
            && *other != id
            && self.arena.contains(*other)
        {
            return Ok(());
        }
        self.container.remove(slot)?;
        if let Some(occupant) = self.occupants.get_mut(slot) {
            *occupant = None;
        }
        Ok(())
    }

    /// Instantiates the declared builders. Runs once, before the first render.
    pub(crate) fn instantiate_pending(
        &mut self,
        states: &mut StateStore<Watcher>,
        config: &ViewConfig,
    ) -> Result<()> {
        let builders = core::mem::take(&mut self.pending);
        let mut planner = SlotPlanner::new(config, &self.container);
        for builder in &builders {
            planner.reserve_fixed(builder)?;
        }
        for builder in builders {
            let id = self.instantiate(states, config, &mut planner, builder, None)?;
            self.roots.push(id);
        }
        debug!(
            viewer = %self.viewer,
            components = self.arena.len(),
            "session components instantiated"
        );
        Ok(())
    }

    fn instantiate(
        &mut self,
        states: &mut StateStore<Watcher>,
        config: &ViewConfig,
        planner: &mut SlotPlanner,
        builder: ComponentBuilder<I>,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId> {
        match builder {
            ComponentBuilder::Item(item) => {
                let position = match item.placement {
                    Placement::Fixed(slot) => Some(slot),
                    Placement::NextAvailable => Some(planner.next_of(AVAILABLE_SLOT)?),
                    Placement::Layout(character) => Some(planner.next_of(character)?),
                    Placement::Unassigned => None,
                };
                self.insert(states, item.build(position, config), parent)
            }
            ComponentBuilder::Composite(group) => {
                let mut component =
                    Component::new(ComponentKind::Composite, group.key.unwrap_or_default());
                component.display_if = group.display_if;
                component.watching = group.watching;
                let id = self.insert(states, component, parent)?;
                let mut children = Vec::with_capacity(group.children.len());
                for child in group.children {
                    children.push(self.instantiate(states, config, planner, child, Some(id))?);
                }
                self.record_mut(id)?.children = children;
                Ok(id)
            }
            ComponentBuilder::LayoutSlot(layout) => {
                let slots = planner.all_of(layout.character)?;
                let mut component = Component::new(ComponentKind::LayoutSlot, String::new());
                component.source = Some(Source::Layout {
                    character: layout.character,
                    slots,
                    factory: layout.factory,
                });
                self.insert(states, component, parent)
            }
            ComponentBuilder::Pagination(pages) => {
                let slots = match pages.target {
                    PageTarget::Layout(character) => planner.all_of(character)?,
                    PageTarget::Slots(slots) => slots,
                };
                let mut component =
                    Component::new(ComponentKind::Pagination, pages.key.unwrap_or_default());
                component.display_if = pages.display_if;
                component.watching = pages.watching;
                component.source = Some(Source::Pages(PageState {
                    page: 0,
                    previous: 0,
                    page_count: 1,
                    len: 0,
                    slots,
                    elements: pages.elements,
                    on_page_switch: pages.on_page_switch,
                }));
                self.insert(states, component, parent)
            }
        }
    }

    /// Instantiates an item created while the session runs, below `parent`.
    pub(crate) fn insert_item(
        &mut self,
        states: &mut StateStore<Watcher>,
        config: &ViewConfig,
        item: ItemBuilder<I>,
        slot: usize,
        parent: ComponentId,
    ) -> Result<ComponentId> {
        self.insert(states, item.build(Some(slot), config), Some(parent))
    }

    fn insert(
        &mut self,
        states: &mut StateStore<Watcher>,
        mut component: Component<I>,
        parent: Option<ComponentId>,
    ) -> Result<ComponentId> {
        let explicit = !component.key.is_empty();
        if explicit && self.keys.contains_key(component.key.as_str()) {
            return Err(Error::DuplicateKey { key: component.key });
        }
        component.parent = parent;
        let watching = component.watching.clone();
        let kind = component.kind;
        let id = self.arena.insert(component);
        let record = self.record_mut(id)?;
        if !explicit {
            record.key = format!("{}@{}.{}", kind.name(), id.index(), id.generation());
        }
        let key = record.key.clone();
        let position = record.position;
        trace!(viewer = %self.viewer, key = %key, ?position, "component instantiated");
        self.keys.insert(key, id);
        for state in watching {
            states.watch(
                state,
                Watcher {
                    session: self.id,
                    component: id,
                },
            );
        }
        Ok(id)
    }

    pub(crate) fn mark_rendered(&mut self) {
        self.rendered = true;
    }

    pub(crate) fn into_container(self) -> alloc::boxed::Box<dyn Container<I>> {
        self.container.into_inner()
    }
}

impl<I> fmt::Debug for RenderContext<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("id", &self.id)
            .field("viewer", &self.viewer)
            .field("components", &self.arena.len())
            .field("rendered", &self.rendered)
            .finish_non_exhaustive()
    }
}

fn stale(id: ComponentId) -> Error {
    Error::UnknownComponent {
        key: format!("{id:?}"),
    }
}

/// Hands out slots while a session's builders are instantiated.
struct SlotPlanner {
    chars: Option<Vec<char>>,
    claimed: Vec<bool>,
    reserved: Vec<bool>,
}

impl SlotPlanner {
    fn new<I: 'static>(config: &ViewConfig, container: &SlotGuard<I>) -> Self {
        let size = config.size;
        Self {
            chars: config.layout_chars(),
            claimed: vec![false; size],
            reserved: (0..size).map(|slot| container.is_reserved_slot(slot)).collect(),
        }
    }

    fn size(&self) -> usize {
        self.claimed.len()
    }

    fn claim(&mut self, slot: usize) -> Result<usize> {
        let size = self.size();
        let claimed = self
            .claimed
            .get_mut(slot)
            .ok_or(Error::SlotOutOfRange { slot, size })?;
        *claimed = true;
        Ok(slot)
    }

    /// Claims fixed slots up front so that no other placement takes them.
    fn reserve_fixed<I>(&mut self, builder: &ComponentBuilder<I>) -> Result<()> {
        match builder {
            ComponentBuilder::Item(item) => {
                if let Placement::Fixed(slot) = item.placement {
                    self.claim(slot)?;
                }
            }
            ComponentBuilder::Composite(group) => {
                for child in &group.children {
                    self.reserve_fixed(child)?;
                }
            }
            ComponentBuilder::Pagination(pages) => {
                if let PageTarget::Slots(slots) = &pages.target {
                    for &slot in slots {
                        self.claim(slot)?;
                    }
                }
            }
            ComponentBuilder::LayoutSlot(_) => {}
        }
        Ok(())
    }

    /// Whether `slot` is free and eligible for `character`.
    ///
    /// [`AVAILABLE_SLOT`] falls back to every non-reserved slot when the layout
    /// does not use it.
    fn eligible(&self, slot: usize, character: char, in_layout: bool) -> bool {
        if self.claimed[slot] {
            return false;
        }
        if in_layout {
            self.chars
                .as_ref()
                .is_some_and(|chars| chars.get(slot) == Some(&character))
        } else {
            character == AVAILABLE_SLOT && !self.reserved[slot]
        }
    }

    fn in_layout(&self, character: char) -> bool {
        self.chars
            .as_ref()
            .is_some_and(|chars| chars.contains(&character))
    }

    fn next_of(&mut self, character: char) -> Result<usize> {
        let in_layout = self.in_layout(character);
        let slot = (0..self.size())
            .find(|&slot| self.eligible(slot, character, in_layout))
            .ok_or(Error::LayoutOverflow { character })?;
        self.claim(slot)
    }

    fn all_of(&mut self, character: char) -> Result<Vec<usize>> {
        let in_layout = self.in_layout(character);
        if !in_layout && character != AVAILABLE_SLOT {
            return Err(Error::LayoutOverflow { character });
        }
        let slots: Vec<usize> = (0..self.size())
            .filter(|&slot| self.eligible(slot, character, in_layout))
            .collect();
        for &slot in &slots {
            self.claimed[slot] = true;
        }
        Ok(slots)
    }
}

/// Runs `phase` against `subject`, with container writes allowed.
pub(crate) fn dispatch<I: 'static>(
    view: &View<I>,
    phase: Phase,
    subject: &mut Subject<'_, I>,
) -> Result<Outcome> {
    subject.scope_mut().session.container.enter();
    let outcome = view
        .pipeline()
        .run(phase, subject, |interceptor, ctx, subject| {
            interceptor(ctx, subject)
        });
    subject.scope_mut().session.container.leave();
    outcome
}

/// Evaluates the display predicate of `id`. Absent predicates allow rendering.
pub(crate) fn should_render<I: 'static>(scope: &Scope<'_, I>, id: ComponentId) -> Result<bool> {
    let predicate = scope.session.record(id)?.display_if.clone();
    Ok(predicate.is_none_or(|predicate| predicate(&scope.display())))
}

/// Runs the RENDER phase for `id` if its display predicate allows it.
///
/// Returns whether the phase ran.
pub(crate) fn render_component<I: Clone + 'static>(
    mut scope: Scope<'_, I>,
    id: ComponentId,
) -> Result<bool> {
    if scope.session.record(id)?.is_hidden() || !should_render(&scope, id)? {
        trace!(viewer = %scope.session.viewer, key = scope.session.key_of(id), "render skipped");
        return Ok(false);
    }
    trace!(viewer = %scope.session.viewer, key = scope.session.key_of(id), "render");
    scope.session.mark_updated(id);
    let view = scope.view;
    let mut subject = Subject::Render(ComponentRenderContext::new(scope, id));
    dispatch(view, Phase::Render, &mut subject)?;
    if let Some(component) = subject.scope_mut().session.get_mut(id) {
        component.set_flag(ComponentFlags::RENDERED, true);
    }
    Ok(true)
}

/// Runs the UPDATE phase for `id`. `force` bypasses the static-component
/// shortcut.
///
/// Hidden components are skipped, and so is a component already updated in
/// the running flush round.
pub(crate) fn update_component<I: Clone + 'static>(
    mut scope: Scope<'_, I>,
    id: ComponentId,
    force: bool,
    reason: UpdateReason,
) -> Result<()> {
    if scope.session.record(id)?.is_hidden() {
        trace!(
            viewer = %scope.session.viewer,
            key = scope.session.key_of(id),
            "update skipped, hidden"
        );
        return Ok(());
    }
    if !scope.session.note_update(id) {
        trace!(
            viewer = %scope.session.viewer,
            key = scope.session.key_of(id),
            "already updated this round"
        );
        return Ok(());
    }
    trace!(
        viewer = %scope.session.viewer,
        key = scope.session.key_of(id),
        force,
        reason = ?reason,
        "update"
    );
    let view = scope.view;
    let mut subject = Subject::Update(ComponentUpdateContext::new(scope, id, force, reason));
    dispatch(view, Phase::Update, &mut subject)?;
    Ok(())
}

/// Runs the CLEAR phase for `id`. The component stays registered.
pub(crate) fn clear_component<I: Clone + 'static>(
    scope: Scope<'_, I>,
    id: ComponentId,
) -> Result<()> {
    scope.session.record(id)?;
    trace!(viewer = %scope.session.viewer, key = scope.session.key_of(id), "clear");
    let view = scope.view;
    let mut subject = Subject::Clear(ComponentClearContext::new(scope, id));
    dispatch(view, Phase::Clear, &mut subject)?;
    if let Some(component) = subject.scope_mut().session.get_mut(id) {
        component.set_flag(ComponentFlags::RENDERED, false);
    }
    Ok(())
}

/// Lifts an explicit hide of `id` and renders it.
pub(crate) fn show<I: Clone + 'static>(mut scope: Scope<'_, I>, id: ComponentId) -> Result<()> {
    let component = scope.session.record_mut(id)?;
    component.set_flag(ComponentFlags::HIDDEN, false);
    component.set_flag(ComponentFlags::VISIBLE, true);
    render_component(scope.reborrow(), id)?;
    Ok(())
}

/// Hides `id` until [`show`] and clears it. State changes do not bring it back.
pub(crate) fn hide<I: Clone + 'static>(mut scope: Scope<'_, I>, id: ComponentId) -> Result<()> {
    scope.session.record_mut(id)?.set_flag(ComponentFlags::HIDDEN, true);
    conceal(scope.reborrow(), id)
}

/// Marks `id` not visible and clears it. The next update that passes its
/// display predicate renders it again.
pub(crate) fn conceal<I: Clone + 'static>(mut scope: Scope<'_, I>, id: ComponentId) -> Result<()> {
    scope.session.record_mut(id)?.set_flag(ComponentFlags::VISIBLE, false);
    clear_component(scope.reborrow(), id)
}

/// First render of a session: every root, in declaration order.
pub(crate) fn render_roots<I: Clone + 'static>(mut scope: Scope<'_, I>) -> Result<()> {
    let roots = scope.session.roots.clone();
    for root in roots {
        render_component(scope.reborrow(), root)?;
    }
    scope.session.mark_rendered();
    debug!(viewer = %scope.session.viewer, "first render complete");
    Ok(())
}

/// Clears every visible root, before the session goes away.
pub(crate) fn clear_roots<I: Clone + 'static>(mut scope: Scope<'_, I>) -> Result<()> {
    let roots = scope.session.roots.clone();
    for root in roots {
        if scope.session.get(root).is_some_and(Component::is_visible) {
            clear_component(scope.reborrow(), root)?;
        }
    }
    Ok(())
}
