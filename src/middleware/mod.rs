//! Middleware pipeline.
//!
//! # Data Flow
//! ```text
//! Context (per request, &mut)
//!     → middleware[0].handle(ctx, next)
//!         → code before next.run(ctx)
//!         → middleware[1].handle(ctx, next) → ... → end of chain
//!         → code after next.run(ctx)
//!     → Response built from Context
//! ```
//!
//! # Design Decisions
//! - Every middleware receives the rest of the pipeline as `Next`
//! - The context is passed by `&mut`, never cloned between stages
//! - A wrapper may splice a `Continuation` between an inner chain and the
//!   outer pipeline (this is how mounts restore paths around `next`)

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::HandlerResult;
use crate::http::Context;

pub mod compose;

pub use compose::{compose, from_fn, App, Composed, FnMiddleware, IntoMiddleware};

/// A stage of the request pipeline.
#[async_trait]
pub trait Middleware: Send + Sync {
    /// Process the request. Call `next.run(ctx)` to hand control downstream.
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult;

    /// Name used in log events.
    fn name(&self) -> &str {
        "anonymous"
    }
}

/// Resumes an outer pipeline once an inner chain runs out.
#[async_trait]
pub trait Continuation: Send + Sync {
    async fn resume(&self, ctx: &mut Context) -> HandlerResult;
}

/// The remainder of a pipeline.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    chain: &'a [Arc<dyn Middleware>],
    tail: Option<&'a dyn Continuation>,
}

impl<'a> Next<'a> {
    /// Run `chain`, then hand over to `tail` if there is one.
    pub fn new(chain: &'a [Arc<dyn Middleware>], tail: Option<&'a dyn Continuation>) -> Self {
        Self { chain, tail }
    }

    /// A pipeline that consists only of `tail`.
    pub fn continuation(tail: &'a dyn Continuation) -> Self {
        Self {
            chain: &[],
            tail: Some(tail),
        }
    }

    /// The end of the pipeline. Running it does nothing.
    pub fn end() -> Self {
        Self {
            chain: &[],
            tail: None,
        }
    }

    pub async fn run(self, ctx: &mut Context) -> HandlerResult {
        match self.chain.split_first() {
            Some((head, rest)) => {
                let next = Next {
                    chain: rest,
                    tail: self.tail,
                };
                head.handle(ctx, next).await
            }
            None => match self.tail {
                Some(tail) => tail.resume(ctx).await,
                None => Ok(()),
            },
        }
    }
}

#[async_trait]
impl<'a> Continuation for Next<'a> {
    async fn resume(&self, ctx: &mut Context) -> HandlerResult {
        (*self).run(ctx).await
    }
}
