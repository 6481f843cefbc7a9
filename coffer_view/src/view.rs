// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Menu definitions.

use alloc::rc::Rc;
use alloc::vec::Vec;
use core::fmt;

use coffer_pipeline::{Phase, Pipeline, PipelineContext};

use crate::builder::{ComponentBuilder, ItemBuilder, LayoutSlotBuilder, Placement};
use crate::config::ViewConfig;
use crate::context::{CloseContext, FirstRenderContext, OpenContext, Subject};
use crate::error::Result;
use crate::interceptors;

/// A pipeline interceptor.
///
/// Returning an error aborts the rest of the phase and surfaces from the
/// [`Frame`](crate::Frame) operation that started it.
pub type Interceptor<I> = Rc<dyn Fn(&mut PipelineContext, &mut Subject<'_, I>) -> Result<()>>;

pub(crate) type OpenHook = Rc<dyn Fn(&mut OpenContext<'_>)>;
pub(crate) type FirstRenderHook<I> = Rc<dyn Fn(&mut FirstRenderContext<'_, I>)>;
pub(crate) type CloseHook = Rc<dyn Fn(&mut CloseContext<'_>)>;

/// A menu definition, shared by every session opened from it.
///
/// Components declared here are instantiated again for each session, so a
/// view holds no per-viewer state of its own.
///
/// ```
/// use coffer_view::{ItemBuilder, View, ViewConfig};
///
/// let mut view = View::<&str>::new(ViewConfig::rows(1).title("Shop"));
/// view.slot(4, ItemBuilder::new().key("buy").with_item("emerald"));
/// view.available_slot(ItemBuilder::new().with_item("filler"));
/// assert_eq!(view.builders().len(), 2);
/// ```
pub struct View<I> {
    config: ViewConfig,
    builders: Vec<ComponentBuilder<I>>,
    pipeline: Pipeline<Interceptor<I>>,
    pub(crate) on_open: Option<OpenHook>,
    pub(crate) on_first_render: Option<FirstRenderHook<I>>,
    pub(crate) on_close: Option<CloseHook>,
}

impl<I: Clone + 'static> View<I> {
    /// Creates a view with the default interceptors installed.
    #[must_use]
    pub fn new(config: ViewConfig) -> Self {
        let mut pipeline: Pipeline<Interceptor<I>> = Pipeline::new();
        pipeline
            .intercept(Phase::Render, Rc::new(interceptors::component_render::<I>))
            .intercept(Phase::Update, Rc::new(interceptors::component_update::<I>))
            .intercept(Phase::Click, Rc::new(interceptors::component_click::<I>))
            .intercept(Phase::Click, Rc::new(interceptors::close_on_click::<I>))
            .intercept(Phase::Click, Rc::new(interceptors::cancel_on_click::<I>))
            .intercept(Phase::Clear, Rc::new(interceptors::component_clear::<I>));
        Self {
            config,
            builders: Vec::new(),
            pipeline,
            on_open: None,
            on_first_render: None,
            on_close: None,
        }
    }
}

impl<I> View<I> {
    /// The view configuration.
    #[must_use]
    pub fn config(&self) -> &ViewConfig {
        &self.config
    }

    /// The view's pipeline.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<Interceptor<I>> {
        &self.pipeline
    }

    /// Components declared for every session, in declaration order.
    #[must_use]
    pub fn builders(&self) -> &[ComponentBuilder<I>] {
        &self.builders
    }

    /// Declares a component.
    pub fn component(&mut self, builder: impl Into<ComponentBuilder<I>>) -> &mut Self {
        self.builders.push(builder.into());
        self
    }

    /// Declares an item at `slot`.
    pub fn slot(&mut self, slot: usize, item: ItemBuilder<I>) -> &mut Self {
        self.component(item.placed(Placement::Fixed(slot)))
    }

    /// Declares an item in the next available slot.
    ///
    /// Available slots are those of the `O` layout character when the layout has
    /// one, otherwise any slot no fixed component claimed.
    pub fn available_slot(&mut self, item: ItemBuilder<I>) -> &mut Self {
        self.component(item.placed(Placement::NextAvailable))
    }

    /// Fills every slot of the layout `character` with an item from `factory`,
    /// which receives the index of the slot within the character's slots.
    pub fn layout_slot(
        &mut self,
        character: char,
        factory: impl Fn(usize) -> ItemBuilder<I> + 'static,
    ) -> &mut Self {
        self.component(LayoutSlotBuilder::new(character, factory))
    }

    /// Appends an interceptor to `phase`, after the default ones.
    pub fn intercept(
        &mut self,
        phase: Phase,
        interceptor: impl Fn(&mut PipelineContext, &mut Subject<'_, I>) -> Result<()> + 'static,
    ) -> &mut Self {
        self.pipeline.intercept(phase, Rc::new(interceptor));
        self
    }

    /// Inserts an interceptor before the default ones of `phase`.
    ///
    /// Calling [`PipelineContext::finish`] from it suppresses the default
    /// behavior for that subject.
    pub fn intercept_first(
        &mut self,
        phase: Phase,
        interceptor: impl Fn(&mut PipelineContext, &mut Subject<'_, I>) -> Result<()> + 'static,
    ) -> &mut Self {
        self.pipeline.intercept_first(phase, Rc::new(interceptor));
        self
    }

    /// Runs before a session is created. Cancelling refuses the open.
    pub fn on_open(&mut self, hook: impl Fn(&mut OpenContext<'_>) + 'static) -> &mut Self {
        self.on_open = Some(Rc::new(hook));
        self
    }

    /// Runs once per session, before its first render, to declare
    /// per-session components.
    pub fn on_first_render(
        &mut self,
        hook: impl Fn(&mut FirstRenderContext<'_, I>) + 'static,
    ) -> &mut Self {
        self.on_first_render = Some(Rc::new(hook));
        self
    }

    /// Runs after a session's components were cleared.
    pub fn on_close(&mut self, hook: impl Fn(&mut CloseContext<'_>) + 'static) -> &mut Self {
        self.on_close = Some(Rc::new(hook));
        self
    }
}

impl<I> fmt::Debug for View<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("title", &self.config.title)
            .field("size", &self.config.size)
            .field("components", &self.builders.len())
            .field("pipeline", &self.pipeline)
            .finish_non_exhaustive()
    }
}
