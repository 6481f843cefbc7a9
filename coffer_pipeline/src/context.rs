// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-run pipeline state.

use crate::phase::Phase;

/// Mutable state shared by the interceptors of a single pipeline run.
///
/// A new context is created for every call to [`Pipeline::run`](crate::Pipeline::run),
/// so flags never leak from one run into the next.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PipelineContext {
    phase: Phase,
    finished: bool,
}

impl PipelineContext {
    /// Creates a context for a run of `phase`.
    #[must_use]
    pub const fn new(phase: Phase) -> Self {
        Self {
            phase,
            finished: false,
        }
    }

    /// The phase being run.
    #[must_use]
    #[inline]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Skips every interceptor after the current one in this run.
    #[inline]
    pub fn finish(&mut self) {
        self.finished = true;
    }

    /// Returns `true` once an interceptor has called [`finish`](Self::finish).
    #[must_use]
    #[inline]
    pub const fn is_finished(&self) -> bool {
        self.finished
    }
}

/// How a pipeline run ended.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// Every interceptor ran.
    Completed,
    /// The interceptor at index `at` called [`PipelineContext::finish`].
    Finished {
        /// Index of the finishing interceptor within the phase.
        at: usize,
    },
}

impl Outcome {
    /// Returns `true` if the run was cut short by `finish()`.
    #[must_use]
    #[inline]
    pub const fn is_finished(self) -> bool {
        matches!(self, Self::Finished { .. })
    }
}
