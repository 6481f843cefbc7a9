// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Lifecycle strategies, one per [`ComponentKind`](crate::ComponentKind).

use alloc::string::String;
use alloc::vec::Vec;

use tracing::trace;

use crate::component::{ComponentFlags, Source};
use crate::context::{
    ComponentClearContext, ComponentRenderContext, ComponentUpdateContext, SlotClickContext,
    UpdateReason,
};
use crate::error::{Error, Result};
use crate::pagination;
use crate::render::{self, should_render};

/// Behavior of a component kind across the four lifecycle events.
///
/// Handles are stateless: the component they act on travels in the context,
/// so one handle value serves every component of its kind.
pub trait ComponentHandle<I> {
    /// The component is being written to the container.
    fn rendered(&self, ctx: &mut ComponentRenderContext<'_, I>) -> Result<()>;
    /// The component is being updated.
    fn updated(&self, ctx: &mut ComponentUpdateContext<'_, I>) -> Result<()>;
    /// The component's slot was clicked.
    fn clicked(&self, ctx: &mut SlotClickContext<'_, I>) -> Result<()>;
    /// The component is being removed from the container.
    fn cleared(&self, ctx: &mut ComponentClearContext<'_, I>) -> Result<()>;
}

/// Handle of [`ComponentKind::Item`](crate::ComponentKind::Item).
#[derive(Copy, Clone, Debug, Default)]
pub struct ItemHandle;

impl ItemHandle {
    fn render_static<I: Clone + 'static>(ctx: &mut ComponentRenderContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        let session = &mut *ctx.scope.session;
        let component = session.record(id)?;
        let position = component.position;
        match component.item.clone() {
            Some(item) => {
                let slot = position.ok_or_else(|| Error::MissingPosition {
                    key: component.key.clone(),
                })?;
                session.write(id, slot, item)?;
            }
            None => {
                if !position.is_some_and(|slot| session.container.is_reserved_slot(slot)) {
                    return Err(Error::MissingRenderPayload {
                        key: component.key.clone(),
                        slot: position,
                    });
                }
            }
        }
        session
            .record_mut(id)?
            .set_flag(ComponentFlags::VISIBLE, true);
        Ok(())
    }
}

impl<I: Clone + 'static> ComponentHandle<I> for ItemHandle {
    fn rendered(&self, ctx: &mut ComponentRenderContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        let (initial, render) = {
            let component = ctx.scope.session.record(id)?;
            (component.position, component.render.clone())
        };
        let Some(render) = render else {
            return Self::render_static(ctx);
        };

        render(ctx);

        let fallback = ctx.result.take();
        let session = &mut *ctx.scope.session;
        let component = session.record(id)?;
        let updated = component.position;
        if !component.is_managed_externally() {
            if initial.is_none() && updated.is_none() {
                return Err(Error::MissingPosition {
                    key: component.key.clone(),
                });
            }
            if let Some(old) = initial.filter(|&old| Some(old) != updated) {
                if let Some(new) = updated
                    && let Some(occupant) = session.occupant(new).filter(|&other| other != id)
                {
                    let err = Error::SlotCollision {
                        key: component.key.clone(),
                        slot: new,
                        occupant: String::from(session.key_of(occupant)),
                    };
                    session.record_mut(id)?.position = initial;
                    return Err(err);
                }
                trace!(key = session.key_of(id), from = old, to = ?updated, "item moved");
                session.erase(id, old)?;
                session
                    .record_mut(id)?
                    .set_flag(ComponentFlags::VISIBLE, false);
            }
        }

        let item = match fallback {
            Some(item) => Some(item),
            None => session.record(id)?.item.clone(),
        };
        if let (Some(slot), Some(item)) = (updated, item) {
            session.write(id, slot, item)?;
        }
        session
            .record_mut(id)?
            .set_flag(ComponentFlags::VISIBLE, true);
        Ok(())
    }

    fn updated(&self, ctx: &mut ComponentUpdateContext<'_, I>) -> Result<()> {
        if ctx.cancelled {
            return Ok(());
        }
        let id = ctx.component;
        let (is_static, visible, on_update) = {
            let component = ctx.scope.session.record(id)?;
            (
                component.display_if.is_none() && component.render.is_none(),
                component.is_visible(),
                component.on_update.clone(),
            )
        };
        if !ctx.force && is_static {
            return Ok(());
        }
        if !should_render(&ctx.scope, id)? {
            if visible {
                render::conceal(ctx.scope.reborrow(), id)?;
            }
            return Ok(());
        }
        if visible && let Some(on_update) = on_update {
            on_update(ctx);
            if ctx.cancelled {
                return Ok(());
            }
        }
        render::render_component(ctx.scope.reborrow(), id)?;
        Ok(())
    }

    fn clicked(&self, ctx: &mut SlotClickContext<'_, I>) -> Result<()> {
        let Some(id) = ctx.component else {
            return Ok(());
        };
        let (flags, on_click) = {
            let component = ctx.scope.session.record(id)?;
            (component.flags, component.on_click.clone())
        };
        if ctx.cancel.is_none() {
            ctx.cancel = Some(flags.contains(ComponentFlags::CANCEL_ON_CLICK));
        }
        if let Some(on_click) = on_click {
            on_click(ctx);
        }
        if flags.contains(ComponentFlags::UPDATE_ON_CLICK) {
            ctx.update();
        }
        Ok(())
    }

    fn cleared(&self, ctx: &mut ComponentClearContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        if let Some(slot) = ctx.scope.session.record(id)?.position {
            ctx.scope.session.erase(id, slot)?;
        }
        Ok(())
    }
}

/// Handle of [`ComponentKind::Composite`](crate::ComponentKind::Composite).
///
/// Forwards every event to the children.
#[derive(Copy, Clone, Debug, Default)]
pub struct CompositeHandle;

impl<I: Clone + 'static> ComponentHandle<I> for CompositeHandle {
    fn rendered(&self, ctx: &mut ComponentRenderContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        for child in ctx.scope.session.children_of(id) {
            render::render_component(ctx.scope.reborrow(), child)?;
        }
        ctx.scope
            .session
            .record_mut(id)?
            .set_flag(ComponentFlags::VISIBLE, true);
        Ok(())
    }

    fn updated(&self, ctx: &mut ComponentUpdateContext<'_, I>) -> Result<()> {
        if ctx.cancelled {
            return Ok(());
        }
        let id = ctx.component;
        let visible = ctx.scope.session.record(id)?.is_visible();
        if !should_render(&ctx.scope, id)? {
            if visible {
                render::conceal(ctx.scope.reborrow(), id)?;
            }
            return Ok(());
        }
        if !visible {
            render::render_component(ctx.scope.reborrow(), id)?;
            return Ok(());
        }
        for child in ctx.scope.session.children_of(id) {
            render::update_component(ctx.scope.reborrow(), child, ctx.force, ctx.reason.clone())?;
        }
        Ok(())
    }

    fn clicked(&self, _ctx: &mut SlotClickContext<'_, I>) -> Result<()> {
        Ok(())
    }

    fn cleared(&self, ctx: &mut ComponentClearContext<'_, I>) -> Result<()> {
        for child in ctx.scope.session.children_of(ctx.component) {
            render::clear_component(ctx.scope.reborrow(), child)?;
        }
        Ok(())
    }
}

/// Handle of [`ComponentKind::LayoutSlot`](crate::ComponentKind::LayoutSlot).
///
/// Builds one item per layout slot on first render, then behaves like a
/// composite.
#[derive(Copy, Clone, Debug, Default)]
pub struct LayoutSlotHandle;

impl<I: Clone + 'static> ComponentHandle<I> for LayoutSlotHandle {
    fn rendered(&self, ctx: &mut ComponentRenderContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        let component = ctx.scope.session.record(id)?;
        let source = match &component.source {
            Some(Source::Layout { slots, factory, .. }) if component.children.is_empty() => {
                Some((slots.clone(), factory.clone()))
            }
            _ => None,
        };
        if let Some((slots, factory)) = source {
            let config = ctx.scope.view.config();
            let mut children = Vec::with_capacity(slots.len());
            for (index, slot) in slots.into_iter().enumerate() {
                children.push(ctx.scope.session.insert_item(
                    ctx.scope.states,
                    config,
                    factory(index),
                    slot,
                    id,
                )?);
            }
            ctx.scope.session.record_mut(id)?.children = children;
        }
        ComponentHandle::<I>::rendered(&CompositeHandle, ctx)
    }

    fn updated(&self, ctx: &mut ComponentUpdateContext<'_, I>) -> Result<()> {
        ComponentHandle::<I>::updated(&CompositeHandle, ctx)
    }

    fn clicked(&self, ctx: &mut SlotClickContext<'_, I>) -> Result<()> {
        ComponentHandle::<I>::clicked(&CompositeHandle, ctx)
    }

    fn cleared(&self, ctx: &mut ComponentClearContext<'_, I>) -> Result<()> {
        ComponentHandle::<I>::cleared(&CompositeHandle, ctx)
    }
}

/// Handle of [`ComponentKind::Pagination`](crate::ComponentKind::Pagination).
///
/// The current page's items are built on render and freed whenever the
/// pagination updates, so a page switch or a change of the element list always
/// rebuilds from scratch.
#[derive(Copy, Clone, Debug, Default)]
pub struct PaginationHandle;

impl<I: Clone + 'static> ComponentHandle<I> for PaginationHandle {
    fn rendered(&self, ctx: &mut ComponentRenderContext<'_, I>) -> Result<()> {
        let id = ctx.component;
        if ctx.scope.session.record(id)?.children.is_empty() {
            pagination::populate(&mut ctx.scope, id)?;
        }
        ComponentHandle::<I>::rendered(&CompositeHandle, ctx)
    }

    fn updated(&self, ctx: &mut ComponentUpdateContext<'_, I>) -> Result<()> {
        if ctx.cancelled {
            return Ok(());
        }
        let id = ctx.component;
        let (visible, on_page_switch) = {
            let component = ctx.scope.session.record(id)?;
            let hook = match &component.source {
                Some(Source::Pages(pages)) => pages.on_page_switch.clone(),
                _ => None,
            };
            (component.is_visible(), hook)
        };
        if !should_render(&ctx.scope, id)? {
            if visible {
                render::conceal(ctx.scope.reborrow(), id)?;
            }
            return Ok(());
        }
        if ctx.reason == UpdateReason::PageSwitch
            && let Some(hook) = on_page_switch
        {
            hook(ctx);
            if ctx.cancelled {
                pagination::restore(ctx.scope.session, id)?;
                return Ok(());
            }
        }
        pagination::release(&mut ctx.scope, id)?;
        render::render_component(ctx.scope.reborrow(), id)?;
        Ok(())
    }

    fn clicked(&self, _ctx: &mut SlotClickContext<'_, I>) -> Result<()> {
        Ok(())
    }

    fn cleared(&self, ctx: &mut ComponentClearContext<'_, I>) -> Result<()> {
        ComponentHandle::<I>::cleared(&CompositeHandle, ctx)
    }
}
