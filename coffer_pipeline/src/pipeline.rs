// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Interceptor storage and the run loop.

use core::fmt;

use smallvec::SmallVec;

use crate::context::{Outcome, PipelineContext};
use crate::phase::Phase;

/// Most phases carry a handful of interceptors; keep them inline.
const INLINE_INTERCEPTORS: usize = 4;

/// Ordered interceptor lists, one per [`Phase`].
///
/// `T` is whatever the embedder uses as an interceptor, typically a boxed or
/// reference-counted closure. The pipeline never calls `T` itself; the `invoke`
/// callback given to [`run`](Self::run) does.
///
/// Phase invocations are stateless: the pipeline keeps no record of previous
/// subjects, so the same pipeline can serve any number of sessions.
pub struct Pipeline<T> {
    phases: [SmallVec<[T; INLINE_INTERCEPTORS]>; Phase::COUNT],
}

impl<T> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Pipeline<T> {
    /// Creates a pipeline with no interceptors.
    #[must_use]
    pub fn new() -> Self {
        Self {
            phases: core::array::from_fn(|_| SmallVec::new()),
        }
    }

    /// Appends an interceptor to `phase`.
    ///
    /// Interceptors run in registration order.
    pub fn intercept(&mut self, phase: Phase, interceptor: T) -> &mut Self {
        self.phases[phase.index()].push(interceptor);
        self
    }

    /// Inserts an interceptor before every interceptor already registered for `phase`.
    pub fn intercept_first(&mut self, phase: Phase, interceptor: T) -> &mut Self {
        self.phases[phase.index()].insert(0, interceptor);
        self
    }

    /// The interceptors registered for `phase`, in run order.
    #[must_use]
    pub fn interceptors(&self, phase: Phase) -> &[T] {
        &self.phases[phase.index()]
    }

    /// Number of interceptors registered for `phase`.
    #[must_use]
    pub fn len(&self, phase: Phase) -> usize {
        self.phases[phase.index()].len()
    }

    /// Returns `true` if no phase has any interceptor.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.phases.iter().all(|p| p.is_empty())
    }

    /// Runs `phase` against `subject`.
    ///
    /// See [`run`] for the propagation rules.
    pub fn run<S: ?Sized, E>(
        &self,
        phase: Phase,
        subject: &mut S,
        invoke: impl FnMut(&T, &mut PipelineContext, &mut S) -> Result<(), E>,
    ) -> Result<Outcome, E> {
        run(self.interceptors(phase), phase, subject, invoke)
    }
}

impl<T> fmt::Debug for Pipeline<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for phase in Phase::ALL {
            map.entry(&phase.name(), &self.len(phase));
        }
        map.finish()
    }
}

/// Walks `interceptors` in order against `subject`.
///
/// - Every interceptor is handed to `invoke` together with the subject and a
///   [`PipelineContext`] created for this walk.
/// - After an interceptor calls [`PipelineContext::finish`], the remaining
///   interceptors are skipped and [`Outcome::Finished`] reports its index.
/// - An `Err` from `invoke` aborts the walk and is returned as is.
///
/// ```
/// use coffer_pipeline::{Outcome, Phase, run};
///
/// let chain = [1, 2, 3];
/// let mut total = 0;
/// let outcome = run(&chain, Phase::Update, &mut total, |n, ctx, total| {
///     *total += *n;
///     if *n == 2 {
///         ctx.finish();
///     }
///     Ok::<_, ()>(())
/// });
/// assert_eq!(outcome, Ok(Outcome::Finished { at: 1 }));
/// assert_eq!(total, 3);
/// ```
pub fn run<T, S: ?Sized, E>(
    interceptors: &[T],
    phase: Phase,
    subject: &mut S,
    mut invoke: impl FnMut(&T, &mut PipelineContext, &mut S) -> Result<(), E>,
) -> Result<Outcome, E> {
    let mut ctx = PipelineContext::new(phase);
    for (at, interceptor) in interceptors.iter().enumerate() {
        invoke(interceptor, &mut ctx, subject)?;
        if ctx.is_finished() {
            return Ok(Outcome::Finished { at });
        }
    }
    Ok(Outcome::Completed)
}
