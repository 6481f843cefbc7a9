// Copyright 2025 the Coffer Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Coffer Pipeline: a deterministic, `no_std` interceptor chain for menu components.
//!
//! ## Overview
//!
//! A [`Pipeline`] holds one ordered interceptor list per [`Phase`]. The phases are
//! fixed and always listed in the same order: render → update → click → clear.
//! Running a phase walks its interceptors in registration order against a caller
//! supplied _subject_ (the context object of the operation being processed).
//!
//! The crate does not know what an interceptor is. It stores values of any type
//! `T` and lets the caller decide how to invoke one, in the same way a responder
//! dispatcher leaves handler execution to its caller. This keeps the subject free
//! to borrow whatever session state it needs for the duration of one run.
//!
//! ## Short-circuiting
//!
//! Each run gets a fresh [`PipelineContext`]. An interceptor may call
//! [`PipelineContext::finish`] to skip the remaining interceptors of the current
//! run. Nothing carries over to the next run of the same phase.
//!
//! ## Failures
//!
//! An interceptor that returns `Err` aborts the remaining chain and the error is
//! handed back to the caller of [`Pipeline::run`] unchanged. Interceptors that ran
//! before the failure keep whatever effects they had.
//!
//! ## Minimal example
//!
//! ```
//! use coffer_pipeline::{Outcome, Phase, Pipeline};
//!
//! type Interceptor = fn(&mut coffer_pipeline::PipelineContext, &mut Vec<&'static str>);
//!
//! let mut pipeline: Pipeline<Interceptor> = Pipeline::new();
//! pipeline.intercept(Phase::Click, |_, seen| seen.push("handler"));
//! pipeline.intercept(Phase::Click, |ctx, seen| {
//!     seen.push("close");
//!     ctx.finish();
//! });
//! pipeline.intercept(Phase::Click, |_, seen| seen.push("cancel"));
//!
//! let mut seen = Vec::new();
//! let outcome = pipeline
//!     .run(Phase::Click, &mut seen, |interceptor, ctx, subject| {
//!         interceptor(ctx, subject);
//!         Ok::<_, ()>(())
//!     })
//!     .unwrap();
//!
//! assert_eq!(seen, ["handler", "close"]);
//! assert_eq!(outcome, Outcome::Finished { at: 1 });
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod context;
mod phase;
mod pipeline;

pub use context::{Outcome, PipelineContext};
pub use phase::Phase;
pub use pipeline::{Pipeline, run};
