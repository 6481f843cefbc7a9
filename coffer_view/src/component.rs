// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-session component records.

use alloc::rc::Rc;
use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use coffer_state::StateId;
use smallvec::SmallVec;

use crate::builder::ItemBuilder;
use crate::context::{
    ComponentRenderContext, ComponentUpdateContext, DisplayContext, SlotClickContext,
};
use crate::handle::{
    ComponentHandle, CompositeHandle, ItemHandle, LayoutSlotHandle, PaginationHandle,
};
use crate::id::ComponentId;

pub(crate) type RenderFn<I> = Rc<dyn Fn(&mut ComponentRenderContext<'_, I>)>;
pub(crate) type UpdateFn<I> = Rc<dyn Fn(&mut ComponentUpdateContext<'_, I>)>;
pub(crate) type ClickFn<I> = Rc<dyn Fn(&mut SlotClickContext<'_, I>)>;
pub(crate) type DisplayFn<I> = Rc<dyn Fn(&DisplayContext<'_, I>) -> bool>;
pub(crate) type SlotFactory<I> = Rc<dyn Fn(usize) -> ItemBuilder<I>>;
pub(crate) type ElementsFn<I> = Rc<dyn Fn(&DisplayContext<'_, I>) -> Vec<ItemBuilder<I>>>;

/// The closed set of component variants.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    /// A single slot.
    Item,
    /// A group of child components.
    Composite,
    /// Every slot of one layout character, filled by a factory on first render.
    LayoutSlot,
    /// A paged window over a list of elements.
    Pagination,
}

impl ComponentKind {
    /// The lifecycle strategy of this kind.
    #[must_use]
    pub fn handle<I: Clone + 'static>(self) -> &'static dyn ComponentHandle<I> {
        match self {
            Self::Item => &ItemHandle,
            Self::Composite => &CompositeHandle,
            Self::LayoutSlot => &LayoutSlotHandle,
            Self::Pagination => &PaginationHandle,
        }
    }

    /// Lowercase name, used in generated keys and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Item => "item",
            Self::Composite => "composite",
            Self::LayoutSlot => "layout-slot",
            Self::Pagination => "pagination",
        }
    }
}

bitflags::bitflags! {
    /// Component state and click behavior.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ComponentFlags: u8 {
        /// The component is shown.
        const VISIBLE            = 0b0000_0001;
        /// The component's content currently sits in the container.
        const RENDERED           = 0b0000_0010;
        /// Slot bookkeeping is left to the component's render handler.
        const MANAGED_EXTERNALLY = 0b0000_0100;
        /// Clicks on the component are cancelled unless a handler decides.
        const CANCEL_ON_CLICK    = 0b0000_1000;
        /// Clicking the component closes the container.
        const CLOSE_ON_CLICK     = 0b0001_0000;
        /// Clicking the component forces an update of it.
        const UPDATE_ON_CLICK    = 0b0010_0000;
        /// Hidden by [`Frame::hide`](crate::Frame::hide). Renders and updates
        /// skip the component until [`Frame::show`](crate::Frame::show).
        const HIDDEN             = 0b0100_0000;
    }
}

/// Position of a [`Pagination`](ComponentKind::Pagination) component.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PageInfo {
    /// Zero-based current page.
    pub page: usize,
    /// Number of pages, at least one.
    pub page_count: usize,
    /// Number of elements across all pages.
    pub len: usize,
    /// Elements per page.
    pub page_size: usize,
}

impl PageInfo {
    /// Returns `true` if a page follows the current one.
    #[must_use]
    pub fn has_next(&self) -> bool {
        self.page + 1 < self.page_count
    }

    /// Returns `true` if a page precedes the current one.
    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.page > 0
    }

    /// Returns `true` on the first page.
    #[must_use]
    pub fn is_first(&self) -> bool {
        self.page == 0
    }

    /// Returns `true` on the last page.
    #[must_use]
    pub fn is_last(&self) -> bool {
        !self.has_next()
    }
}

pub(crate) struct PageState<I> {
    pub(crate) page: usize,
    /// Page shown before the last switch, restored if the switch is cancelled.
    pub(crate) previous: usize,
    pub(crate) page_count: usize,
    pub(crate) len: usize,
    pub(crate) slots: Vec<usize>,
    pub(crate) elements: ElementsFn<I>,
    pub(crate) on_page_switch: Option<UpdateFn<I>>,
}

impl<I> PageState<I> {
    pub(crate) fn info(&self) -> PageInfo {
        PageInfo {
            page: self.page,
            page_count: self.page_count,
            len: self.len,
            page_size: self.slots.len(),
        }
    }
}

/// Where the children of a layout slot or pagination come from.
pub(crate) enum Source<I> {
    Layout {
        character: char,
        slots: Vec<usize>,
        factory: SlotFactory<I>,
    },
    Pages(PageState<I>),
}

/// A component instance of one session.
///
/// Records are passive: the [`ComponentHandle`] of their
/// [`kind`](Self::kind) drives them through render, update, click and clear.
/// Handlers are captured when the view is declared and shared by every
/// session.
pub struct Component<I> {
    pub(crate) key: String,
    pub(crate) kind: ComponentKind,
    pub(crate) parent: Option<ComponentId>,
    pub(crate) children: Vec<ComponentId>,
    pub(crate) position: Option<usize>,
    pub(crate) flags: ComponentFlags,
    pub(crate) watching: SmallVec<[StateId; 2]>,
    pub(crate) display_if: Option<DisplayFn<I>>,
    pub(crate) render: Option<RenderFn<I>>,
    pub(crate) on_update: Option<UpdateFn<I>>,
    pub(crate) on_click: Option<ClickFn<I>>,
    pub(crate) item: Option<I>,
    pub(crate) source: Option<Source<I>>,
}

impl<I> Component<I> {
    pub(crate) fn new(kind: ComponentKind, key: String) -> Self {
        Self {
            key,
            kind,
            parent: None,
            children: Vec::new(),
            position: None,
            flags: ComponentFlags::empty(),
            watching: SmallVec::new(),
            display_if: None,
            render: None,
            on_update: None,
            on_click: None,
            item: None,
            source: None,
        }
    }

    /// Identity key, unique within the session.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Component variant.
    #[must_use]
    pub fn kind(&self) -> ComponentKind {
        self.kind
    }

    /// The enclosing component, if any.
    #[must_use]
    pub fn parent(&self) -> Option<ComponentId> {
        self.parent
    }

    /// Child components, in declaration order.
    #[must_use]
    pub fn children(&self) -> &[ComponentId] {
        &self.children
    }

    /// Bound slot of an item; `None` while unassigned and for groups.
    #[must_use]
    pub fn position(&self) -> Option<usize> {
        self.position
    }

    /// Current flags.
    #[must_use]
    pub fn flags(&self) -> ComponentFlags {
        self.flags
    }

    /// See [`ComponentFlags::VISIBLE`].
    #[must_use]
    pub fn is_visible(&self) -> bool {
        self.flags.contains(ComponentFlags::VISIBLE)
    }

    /// See [`ComponentFlags::HIDDEN`].
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.flags.contains(ComponentFlags::HIDDEN)
    }

    /// See [`ComponentFlags::RENDERED`].
    #[must_use]
    pub fn is_rendered(&self) -> bool {
        self.flags.contains(ComponentFlags::RENDERED)
    }

    /// See [`ComponentFlags::MANAGED_EXTERNALLY`].
    #[must_use]
    pub fn is_managed_externally(&self) -> bool {
        self.flags.contains(ComponentFlags::MANAGED_EXTERNALLY)
    }

    /// States whose changes update this component.
    #[must_use]
    pub fn watching(&self) -> &[StateId] {
        &self.watching
    }

    /// The static item, if any.
    #[must_use]
    pub fn item(&self) -> Option<&I> {
        self.item.as_ref()
    }

    /// Returns `true` if a display predicate decides visibility.
    #[must_use]
    pub fn has_display_predicate(&self) -> bool {
        self.display_if.is_some()
    }

    /// Returns `true` if a render handler computes the content.
    #[must_use]
    pub fn has_render_handler(&self) -> bool {
        self.render.is_some()
    }

    /// Returns `true` if this item is bound to `slot`.
    ///
    /// Always `false` for groups; use
    /// [`RenderContext::is_contained_within`](crate::RenderContext::is_contained_within)
    /// to ask about a whole subtree.
    #[must_use]
    pub fn is_contained_within(&self, slot: usize) -> bool {
        self.kind == ComponentKind::Item && self.position == Some(slot)
    }

    /// Page position of a pagination.
    #[must_use]
    pub fn page(&self) -> Option<PageInfo> {
        match &self.source {
            Some(Source::Pages(pages)) => Some(pages.info()),
            _ => None,
        }
    }

    /// Layout character of a layout slot.
    #[must_use]
    pub fn layout_character(&self) -> Option<char> {
        match &self.source {
            Some(Source::Layout { character, .. }) => Some(*character),
            _ => None,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: ComponentFlags, on: bool) {
        self.flags.set(flag, on);
    }
}

impl<I> fmt::Debug for Component<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("flags", &self.flags)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}
