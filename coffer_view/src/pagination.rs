// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Paged element lists.
//!
//! A pagination owns the items of its current page only. Elements are computed
//! on each populate, so a provider that reads states sees fresh values after
//! every update it watches.

use alloc::string::String;
use alloc::vec::Vec;

use tracing::debug;

use crate::component::{PageInfo, Source};
use crate::context::{Scope, UpdateReason};
use crate::error::{Error, Result};
use crate::id::ComponentId;
use crate::render::{self, RenderContext};

/// A request to move a pagination.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PageSwitch {
    /// The following page. Stays on the last page.
    Next,
    /// The preceding page. Stays on the first page.
    Previous,
    /// A page by index, clamped to the last page.
    To(usize),
}

impl PageSwitch {
    fn target(self, info: PageInfo) -> usize {
        let last = info.page_count.saturating_sub(1);
        match self {
            Self::Next => (info.page + 1).min(last),
            Self::Previous => info.page.saturating_sub(1),
            Self::To(page) => page.min(last),
        }
    }
}

/// Number of pages for `len` elements, never zero.
pub(crate) fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        1
    } else {
        len.div_ceil(page_size).max(1)
    }
}

/// Builds the items of the current page as children of `id`.
///
/// Does not render them.
pub(crate) fn populate<I: Clone + 'static>(scope: &mut Scope<'_, I>, id: ComponentId) -> Result<()> {
    let (elements, slots, page) = match &scope.session.record(id)?.source {
        Some(Source::Pages(pages)) => (pages.elements.clone(), pages.slots.clone(), pages.page),
        _ => return Ok(()),
    };
    let builders = elements(&scope.display());
    let len = builders.len();
    let page_size = slots.len();
    let pages = page_count(len, page_size);
    let page = page.min(pages - 1);

    let config = scope.view.config();
    let mut children = Vec::with_capacity(page_size);
    for (builder, slot) in builders.into_iter().skip(page * page_size).zip(slots) {
        children.push(scope.session.insert_item(scope.states, config, builder, slot, id)?);
    }
    debug!(
        viewer = %scope.session.viewer(),
        key = scope.session.key_of(id),
        page,
        pages,
        len,
        "page populated"
    );

    let record = scope.session.record_mut(id)?;
    record.children = children;
    if let Some(Source::Pages(state)) = &mut record.source {
        state.page = page;
        state.page_count = pages;
        state.len = len;
    }
    Ok(())
}

/// Clears and frees the items of the current page.
pub(crate) fn release<I: Clone + 'static>(scope: &mut Scope<'_, I>, id: ComponentId) -> Result<()> {
    let children = scope.session.children_of(id);
    for &child in &children {
        render::clear_component(scope.reborrow(), child)?;
    }
    for child in children {
        scope.session.free(child);
    }
    scope.session.record_mut(id)?.children.clear();
    Ok(())
}

/// Puts back the page shown before a cancelled switch.
pub(crate) fn restore<I>(session: &mut RenderContext<I>, id: ComponentId) -> Result<()> {
    if let Some(Source::Pages(state)) = &mut session.record_mut(id)?.source {
        state.page = state.previous;
    }
    Ok(())
}

/// Moves the pagination `id` and re-renders it.
///
/// Switching to the page already shown is a no-op. A hidden pagination only
/// moves; its items are built when it is shown.
pub(crate) fn switch<I: Clone + 'static>(
    mut scope: Scope<'_, I>,
    id: ComponentId,
    switch: PageSwitch,
) -> Result<PageInfo> {
    let Some(info) = scope.session.record(id)?.page() else {
        return Err(Error::NotPaginated {
            key: String::from(scope.session.key_of(id)),
        });
    };
    let target = switch.target(info);
    if target == info.page {
        return Ok(info);
    }
    if let Some(Source::Pages(state)) = &mut scope.session.record_mut(id)?.source {
        state.previous = info.page;
        state.page = target;
    }

    if scope.session.record(id)?.is_hidden() {
        // Rebuilt from the new page when shown again.
        release(&mut scope, id)?;
    } else {
        render::update_component(scope.reborrow(), id, true, UpdateReason::PageSwitch)?;
    }
    scope
        .session
        .record(id)?
        .page()
        .ok_or(Error::UnknownComponent {
            key: String::from(scope.session.key_of(id)),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(page: usize, page_count: usize) -> PageInfo {
        PageInfo {
            page,
            page_count,
            len: page_count * 4,
            page_size: 4,
        }
    }

    #[test]
    fn page_count_is_never_zero() {
        assert_eq!(page_count(0, 4), 1);
        assert_eq!(page_count(4, 4), 1);
        assert_eq!(page_count(5, 4), 2);
        assert_eq!(page_count(9, 0), 1);
    }

    #[test]
    fn switches_stay_in_range() {
        assert_eq!(PageSwitch::Next.target(info(0, 3)), 1);
        assert_eq!(PageSwitch::Next.target(info(2, 3)), 2);
        assert_eq!(PageSwitch::Previous.target(info(0, 3)), 0);
        assert_eq!(PageSwitch::Previous.target(info(2, 3)), 1);
        assert_eq!(PageSwitch::To(7).target(info(0, 3)), 2);
    }
}
