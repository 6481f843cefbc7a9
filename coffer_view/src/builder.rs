// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Component builders.
//!
//! Builders are declared once per [`View`](crate::View) and instantiated into
//! [`Component`] records for every session. Handlers are captured here, behind
//! `Rc`, and shared by all instances.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use coffer_state::{State, StateId};
use smallvec::SmallVec;

use crate::component::{
    ClickFn, Component, ComponentFlags, ComponentKind, DisplayFn, ElementsFn, RenderFn,
    SlotFactory, UpdateFn,
};
use crate::config::{AVAILABLE_SLOT, ViewConfig};
use crate::context::{
    ComponentRenderContext, ComponentUpdateContext, DisplayContext, SlotClickContext,
};

/// How an item finds its slot when a session is built.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Exactly this slot. Several items may share one; the last rendered wins.
    Fixed(usize),
    /// The next free slot marked [`AVAILABLE_SLOT`] in the layout, or the next
    /// free, non-reserved slot without a layout.
    NextAvailable,
    /// The next free slot marked with this layout character.
    Layout(char),
    /// No slot; the render handler must pick one with
    /// [`ComponentRenderContext::set_slot`].
    #[default]
    Unassigned,
}

/// Builder of a single-slot item.
///
/// ```
/// use coffer_view::{ItemBuilder, Placement};
///
/// let close = ItemBuilder::at(26)
///     .key("close")
///     .with_item("barrier")
///     .close_on_click(true);
/// assert_eq!(close.placement(), Placement::Fixed(26));
/// ```
#[derive(Clone)]
pub struct ItemBuilder<I> {
    pub(crate) key: Option<String>,
    pub(crate) placement: Placement,
    pub(crate) item: Option<I>,
    pub(crate) render: Option<RenderFn<I>>,
    pub(crate) on_update: Option<UpdateFn<I>>,
    pub(crate) on_click: Option<ClickFn<I>>,
    pub(crate) display_if: Option<DisplayFn<I>>,
    pub(crate) watching: SmallVec<[StateId; 2]>,
    pub(crate) cancel_on_click: Option<bool>,
    pub(crate) close_on_click: Option<bool>,
    pub(crate) update_on_click: Option<bool>,
    pub(crate) managed_externally: bool,
}

impl<I> Default for ItemBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> ItemBuilder<I> {
    /// An unplaced item with no content.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key: None,
            placement: Placement::Unassigned,
            item: None,
            render: None,
            on_update: None,
            on_click: None,
            display_if: None,
            watching: SmallVec::new(),
            cancel_on_click: None,
            close_on_click: None,
            update_on_click: None,
            managed_externally: false,
        }
    }

    /// An item fixed to `slot`.
    #[must_use]
    pub fn at(slot: usize) -> Self {
        Self::new().slot(slot)
    }

    /// Sets the identity key. Keys must be unique within a session.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the placement.
    #[must_use]
    pub fn placed(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    /// Shorthand for `placed(Placement::Fixed(slot))`.
    #[must_use]
    pub fn slot(self, slot: usize) -> Self {
        self.placed(Placement::Fixed(slot))
    }

    /// Current placement.
    #[must_use]
    pub fn placement(&self) -> Placement {
        self.placement
    }

    /// Sets the static item, shown when no render handler supplies one.
    #[must_use]
    pub fn with_item(mut self, item: I) -> Self {
        self.item = Some(item);
        self
    }

    /// Computes the item on every render.
    #[must_use]
    pub fn render_with(mut self, f: impl Fn(&mut ComponentRenderContext<'_, I>) + 'static) -> Self {
        self.render = Some(Rc::new(f));
        self
    }

    /// Runs before the re-render of a visible item during an update.
    #[must_use]
    pub fn on_update(mut self, f: impl Fn(&mut ComponentUpdateContext<'_, I>) + 'static) -> Self {
        self.on_update = Some(Rc::new(f));
        self
    }

    /// Runs when the item is clicked.
    #[must_use]
    pub fn on_click(mut self, f: impl Fn(&mut SlotClickContext<'_, I>) + 'static) -> Self {
        self.on_click = Some(Rc::new(f));
        self
    }

    /// Shows the item only while `f` returns `true`. Must be side-effect free.
    #[must_use]
    pub fn display_if(mut self, f: impl Fn(&DisplayContext<'_, I>) -> bool + 'static) -> Self {
        self.display_if = Some(Rc::new(f));
        self
    }

    /// Updates the item whenever `state` changes.
    #[must_use]
    pub fn watch<T>(mut self, state: State<T>) -> Self {
        if !self.watching.contains(&state.id()) {
            self.watching.push(state.id());
        }
        self
    }

    /// Overrides the view's click cancellation for this item.
    #[must_use]
    pub fn cancel_on_click(mut self, cancel: bool) -> Self {
        self.cancel_on_click = Some(cancel);
        self
    }

    /// Overrides the view's close-on-click for this item.
    #[must_use]
    pub fn close_on_click(mut self, close: bool) -> Self {
        self.close_on_click = Some(close);
        self
    }

    /// Overrides the view's update-on-click for this item.
    #[must_use]
    pub fn update_on_click(mut self, update: bool) -> Self {
        self.update_on_click = Some(update);
        self
    }

    /// Leaves slot bookkeeping to the render handler: no position checks and no
    /// migration on slot changes.
    #[must_use]
    pub fn managed_externally(mut self) -> Self {
        self.managed_externally = true;
        self
    }

    /// Produces the per-session record bound to `position`.
    ///
    /// Unset click flags fall back to `defaults`. An empty key is filled in
    /// once the record has an id.
    pub(crate) fn build(self, position: Option<usize>, defaults: &ViewConfig) -> Component<I> {
        let mut component = Component::new(ComponentKind::Item, self.key.unwrap_or_default());
        component.position = position;
        component.item = self.item;
        component.render = self.render;
        component.on_update = self.on_update;
        component.on_click = self.on_click;
        component.display_if = self.display_if;
        component.watching = self.watching;
        let flags = &mut component.flags;
        flags.set(
            ComponentFlags::CANCEL_ON_CLICK,
            self.cancel_on_click.unwrap_or(defaults.cancel_on_click),
        );
        flags.set(
            ComponentFlags::CLOSE_ON_CLICK,
            self.close_on_click.unwrap_or(defaults.close_on_click),
        );
        flags.set(
            ComponentFlags::UPDATE_ON_CLICK,
            self.update_on_click.unwrap_or(defaults.update_on_click),
        );
        flags.set(ComponentFlags::MANAGED_EXTERNALLY, self.managed_externally);
        component
    }
}

impl<I> fmt::Debug for ItemBuilder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ItemBuilder")
            .field("key", &self.key)
            .field("placement", &self.placement)
            .field("has_item", &self.item.is_some())
            .field("has_render", &self.render.is_some())
            .field("watching", &self.watching)
            .finish_non_exhaustive()
    }
}

/// Builder of a group of components that render, update and clear together.
#[derive(Clone)]
pub struct CompositeBuilder<I> {
    pub(crate) key: Option<String>,
    pub(crate) children: Vec<ComponentBuilder<I>>,
    pub(crate) display_if: Option<DisplayFn<I>>,
    pub(crate) watching: SmallVec<[StateId; 2]>,
}

impl<I> Default for CompositeBuilder<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I> CompositeBuilder<I> {
    /// An empty group.
    #[must_use]
    pub fn new() -> Self {
        Self {
            key: None,
            children: Vec::new(),
            display_if: None,
            watching: SmallVec::new(),
        }
    }

    /// Sets the identity key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Appends a child.
    #[must_use]
    pub fn child(mut self, child: impl Into<ComponentBuilder<I>>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Shows the group only while `f` returns `true`.
    #[must_use]
    pub fn display_if(mut self, f: impl Fn(&DisplayContext<'_, I>) -> bool + 'static) -> Self {
        self.display_if = Some(Rc::new(f));
        self
    }

    /// Updates every child whenever `state` changes.
    #[must_use]
    pub fn watch<T>(mut self, state: State<T>) -> Self {
        if !self.watching.contains(&state.id()) {
            self.watching.push(state.id());
        }
        self
    }
}

impl<I> fmt::Debug for CompositeBuilder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompositeBuilder")
            .field("key", &self.key)
            .field("children", &self.children)
            .finish_non_exhaustive()
    }
}

/// Fills every slot of a layout character with items from a factory.
///
/// Created by [`View::layout_slot`](crate::View::layout_slot). The factory is
/// called with the index of the slot among the character's slots, on first
/// render.
#[derive(Clone)]
pub struct LayoutSlotBuilder<I> {
    pub(crate) character: char,
    pub(crate) factory: SlotFactory<I>,
}

impl<I> LayoutSlotBuilder<I> {
    /// Fills `character` with `factory(index)`.
    #[must_use]
    pub fn new(character: char, factory: impl Fn(usize) -> ItemBuilder<I> + 'static) -> Self {
        Self {
            character,
            factory: Rc::new(factory),
        }
    }
}

impl<I> fmt::Debug for LayoutSlotBuilder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LayoutSlotBuilder")
            .field("character", &self.character)
            .finish_non_exhaustive()
    }
}

/// The slots a pagination fills with page elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PageTarget {
    /// Every slot of a layout character.
    Layout(char),
    /// These slots, in order.
    Slots(Vec<usize>),
}

enum PageSource<I, T> {
    Static(Rc<[T]>),
    Dynamic(Rc<dyn Fn(&DisplayContext<'_, I>) -> Vec<T>>),
}

/// Builder of a pagination over elements of type `T`.
///
/// Each page shows as many elements as there are target slots; `element` turns
/// an element and its overall index into an item.
///
/// ```
/// use coffer_view::{PageTarget, PaginationBuilder};
///
/// let fruit = PaginationBuilder::from_items(vec!["apple", "pear", "plum"], |name: &&str, _| {
///     coffer_view::ItemBuilder::new().with_item(*name)
/// })
/// .key("fruit")
/// .target(PageTarget::Slots(vec![0, 1]));
/// # let _: coffer_view::ComponentBuilder<&str> = fruit.into();
/// ```
pub struct PaginationBuilder<I, T> {
    key: Option<String>,
    source: PageSource<I, T>,
    element: Rc<dyn Fn(&T, usize) -> ItemBuilder<I>>,
    target: PageTarget,
    on_page_switch: Option<UpdateFn<I>>,
    display_if: Option<DisplayFn<I>>,
    watching: SmallVec<[StateId; 2]>,
}

impl<I, T: 'static> PaginationBuilder<I, T> {
    fn with_source(
        source: PageSource<I, T>,
        element: impl Fn(&T, usize) -> ItemBuilder<I> + 'static,
    ) -> Self {
        Self {
            key: None,
            source,
            element: Rc::new(element),
            target: PageTarget::Layout(AVAILABLE_SLOT),
            on_page_switch: None,
            display_if: None,
            watching: SmallVec::new(),
        }
    }

    /// Pages over a fixed list.
    #[must_use]
    pub fn from_items(
        items: impl Into<Rc<[T]>>,
        element: impl Fn(&T, usize) -> ItemBuilder<I> + 'static,
    ) -> Self {
        Self::with_source(PageSource::Static(items.into()), element)
    }

    /// Pages over a list computed on every render of the pagination.
    #[must_use]
    pub fn from_provider(
        provider: impl Fn(&DisplayContext<'_, I>) -> Vec<T> + 'static,
        element: impl Fn(&T, usize) -> ItemBuilder<I> + 'static,
    ) -> Self {
        Self::with_source(PageSource::Dynamic(Rc::new(provider)), element)
    }

    /// Sets the identity key.
    #[must_use]
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Sets the target slots. Defaults to the [`AVAILABLE_SLOT`] character.
    #[must_use]
    pub fn target(mut self, target: PageTarget) -> Self {
        self.target = target;
        self
    }

    /// Shorthand for `target(PageTarget::Layout(character))`.
    #[must_use]
    pub fn layout(self, character: char) -> Self {
        self.target(PageTarget::Layout(character))
    }

    /// Runs before the new page is built.
    #[must_use]
    pub fn on_page_switch(
        mut self,
        f: impl Fn(&mut ComponentUpdateContext<'_, I>) + 'static,
    ) -> Self {
        self.on_page_switch = Some(Rc::new(f));
        self
    }

    /// Shows the pagination only while `f` returns `true`.
    #[must_use]
    pub fn display_if(mut self, f: impl Fn(&DisplayContext<'_, I>) -> bool + 'static) -> Self {
        self.display_if = Some(Rc::new(f));
        self
    }

    /// Rebuilds the current page whenever `state` changes.
    #[must_use]
    pub fn watch<S>(mut self, state: State<S>) -> Self {
        if !self.watching.contains(&state.id()) {
            self.watching.push(state.id());
        }
        self
    }
}

impl<I, T> fmt::Debug for PaginationBuilder<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaginationBuilder")
            .field("key", &self.key)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

/// A [`PaginationBuilder`] with its element type erased.
#[derive(Clone)]
pub struct Paginated<I> {
    pub(crate) key: Option<String>,
    pub(crate) elements: ElementsFn<I>,
    pub(crate) target: PageTarget,
    pub(crate) on_page_switch: Option<UpdateFn<I>>,
    pub(crate) display_if: Option<DisplayFn<I>>,
    pub(crate) watching: SmallVec<[StateId; 2]>,
}

impl<I> fmt::Debug for Paginated<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Paginated")
            .field("key", &self.key)
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl<I: 'static, T: 'static> From<PaginationBuilder<I, T>> for Paginated<I> {
    fn from(builder: PaginationBuilder<I, T>) -> Self {
        let element = builder.element;
        let elements: ElementsFn<I> = match builder.source {
            PageSource::Static(items) => Rc::new(move |_: &DisplayContext<'_, I>| {
                items.iter().enumerate().map(|(i, t)| element(t, i)).collect()
            }),
            PageSource::Dynamic(provider) => Rc::new(move |ctx: &DisplayContext<'_, I>| {
                provider(ctx)
                    .iter()
                    .enumerate()
                    .map(|(i, t)| element(t, i))
                    .collect()
            }),
        };
        Self {
            key: builder.key,
            elements,
            target: builder.target,
            on_page_switch: builder.on_page_switch,
            display_if: builder.display_if,
            watching: builder.watching,
        }
    }
}

/// Any declarable component.
#[derive(Clone)]
pub enum ComponentBuilder<I> {
    /// See [`ItemBuilder`].
    Item(ItemBuilder<I>),
    /// See [`CompositeBuilder`].
    Composite(CompositeBuilder<I>),
    /// See [`LayoutSlotBuilder`].
    LayoutSlot(LayoutSlotBuilder<I>),
    /// See [`PaginationBuilder`].
    Pagination(Paginated<I>),
}

impl<I> ComponentBuilder<I> {
    /// The explicit key, if one was set.
    #[must_use]
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::Item(b) => b.key.as_deref(),
            Self::Composite(b) => b.key.as_deref(),
            Self::LayoutSlot(_) => None,
            Self::Pagination(b) => b.key.as_deref(),
        }
    }

    /// The kind of component this builder produces.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        match self {
            Self::Item(_) => ComponentKind::Item,
            Self::Composite(_) => ComponentKind::Composite,
            Self::LayoutSlot(_) => ComponentKind::LayoutSlot,
            Self::Pagination(_) => ComponentKind::Pagination,
        }
    }
}

impl<I> fmt::Debug for ComponentBuilder<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Item(b) => b.fmt(f),
            Self::Composite(b) => b.fmt(f),
            Self::LayoutSlot(b) => b.fmt(f),
            Self::Pagination(b) => b.fmt(f),
        }
    }
}

impl<I> From<ItemBuilder<I>> for ComponentBuilder<I> {
    fn from(builder: ItemBuilder<I>) -> Self {
        Self::Item(builder)
    }
}

impl<I> From<CompositeBuilder<I>> for ComponentBuilder<I> {
    fn from(builder: CompositeBuilder<I>) -> Self {
        Self::Composite(builder)
    }
}

impl<I> From<LayoutSlotBuilder<I>> for ComponentBuilder<I> {
    fn from(builder: LayoutSlotBuilder<I>) -> Self {
        Self::LayoutSlot(builder)
    }
}

impl<I: 'static, T: 'static> From<PaginationBuilder<I, T>> for ComponentBuilder<I> {
    fn from(builder: PaginationBuilder<I, T>) -> Self {
        Self::Pagination(builder.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use coffer_state::StateStore;

    #[test]
    fn unset_click_flags_follow_the_view() {
        let defaults = ViewConfig::default().close_on_click(true);
        let item = ItemBuilder::<u8>::at(3).cancel_on_click(false).build(Some(3), &defaults);
        assert!(!item.flags().contains(ComponentFlags::CANCEL_ON_CLICK));
        assert!(item.flags().contains(ComponentFlags::CLOSE_ON_CLICK));
        assert!(!item.flags().contains(ComponentFlags::UPDATE_ON_CLICK));
        assert_eq!(item.position(), Some(3));
        assert_eq!(item.key(), "");
    }

    #[test]
    fn watch_dedups_states() {
        let mut store = StateStore::<u8>::new();
        let coins = store.create("coins", 0_u32);
        let item = ItemBuilder::<u8>::new().watch(coins).watch(coins);
        assert_eq!(item.watching.as_slice(), &[coins.id()]);
    }

    #[test]
    fn builders_report_their_kind() {
        let group: ComponentBuilder<u8> = CompositeBuilder::new()
            .key("group")
            .child(ItemBuilder::at(0))
            .into();
        assert_eq!(group.kind(), ComponentKind::Composite);
        assert_eq!(group.key(), Some("group"));

        let pages: ComponentBuilder<u8> =
            PaginationBuilder::from_items(alloc::vec![1_u8, 2], |n, _| {
                ItemBuilder::new().with_item(*n)
            })
            .into();
        assert_eq!(pages.kind(), ComponentKind::Pagination);
    }
}
