// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interceptors every [`View`](crate::View) starts with.
//!
//! Each one hands its subject to the [`ComponentHandle`](crate::ComponentHandle)
//! of the component's kind, or applies a click default. User interceptors
//! registered with [`View::intercept`](crate::View::intercept) run after them.

use coffer_pipeline::PipelineContext;
use tracing::trace;

use crate::component::ComponentFlags;
use crate::context::Subject;
use crate::error::Result;

/// RENDER: the handle writes the component.
pub(crate) fn component_render<I: Clone + 'static>(
    _: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Render(ctx) = subject else {
        return Ok(());
    };
    let kind = ctx.scope.session.record(ctx.component)?.kind();
    kind.handle::<I>().rendered(ctx)
}

/// UPDATE: the handle decides between re-rendering, hiding and nothing.
pub(crate) fn component_update<I: Clone + 'static>(
    _: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Update(ctx) = subject else {
        return Ok(());
    };
    let kind = ctx.scope.session.record(ctx.component)?.kind();
    kind.handle::<I>().updated(ctx)
}

/// CLICK: the handle of the clicked component runs its click handler.
pub(crate) fn component_click<I: Clone + 'static>(
    _: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Click(ctx) = subject else {
        return Ok(());
    };
    let Some(id) = ctx.component else {
        return Ok(());
    };
    let kind = ctx.scope.session.record(id)?.kind();
    kind.handle::<I>().clicked(ctx)
}

/// CLICK: a close request ends the click pass.
///
/// Later interceptors, the default cancellation included, do not run.
pub(crate) fn close_on_click<I: 'static>(
    pipeline: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Click(ctx) = subject else {
        return Ok(());
    };
    let flagged = ctx
        .component()
        .is_some_and(|component| component.flags().contains(ComponentFlags::CLOSE_ON_CLICK));
    if flagged {
        ctx.close = true;
    }
    if ctx.close {
        trace!(viewer = %ctx.scope.session.viewer(), slot = ctx.slot, "close on click");
        pipeline.finish();
    }
    Ok(())
}

/// CLICK: nobody decided the cancellation, so the view default applies.
pub(crate) fn cancel_on_click<I: 'static>(
    _: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Click(ctx) = subject else {
        return Ok(());
    };
    if ctx.cancel.is_none() {
        ctx.cancel = Some(ctx.scope.view.config().cancel_on_click);
    }
    Ok(())
}

/// CLEAR: the handle removes the component from the container.
pub(crate) fn component_clear<I: Clone + 'static>(
    _: &mut PipelineContext,
    subject: &mut Subject<'_, I>,
) -> Result<()> {
    let Subject::Clear(ctx) = subject else {
        return Ok(());
    };
    let kind = ctx.scope.session.record(ctx.component)?.kind();
    kind.handle::<I>().cleared(ctx)
}
