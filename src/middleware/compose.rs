//! Composition of middleware into applications.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use futures_util::future::BoxFuture;

use crate::error::HandlerResult;
use crate::http::Context;
use crate::middleware::{Middleware, Next};

/// Conversion into a shareable middleware.
pub trait IntoMiddleware {
    fn into_middleware(self) -> Arc<dyn Middleware>;
}

impl<M: Middleware + 'static> IntoMiddleware for M {
    fn into_middleware(self) -> Arc<dyn Middleware> {
        Arc::new(self)
    }
}

impl IntoMiddleware for Arc<dyn Middleware> {
    fn into_middleware(self) -> Arc<dyn Middleware> {
        self
    }
}

/// An ordered list of middleware run as one stage.
///
/// When the list is exhausted, control continues with the `next` the
/// composed stage itself was given.
pub struct Composed {
    name: String,
    chain: Vec<Arc<dyn Middleware>>,
}

impl fmt::Debug for Composed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Composed")
            .field("name", &self.name)
            .field("len", &self.chain.len())
            .finish()
    }
}

#[async_trait]
impl Middleware for Composed {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        Next::new(&self.chain, Some(&next)).run(ctx).await
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Compose `chain` into a single middleware.
pub fn compose(chain: Vec<Arc<dyn Middleware>>) -> Composed {
    Composed {
        name: "composed".to_string(),
        chain,
    }
}

/// Middleware backed by a closure.
pub struct FnMiddleware<F> {
    f: F,
}

/// Build a middleware from a closure returning a boxed future.
///
/// ```ignore
/// let greet = from_fn(|ctx, next| Box::pin(async move {
///     next.run(ctx).await?;
///     if ctx.body().is_none() {
///         ctx.set_body("hello");
///     }
///     Ok(())
/// }));
/// ```
pub fn from_fn<F>(f: F) -> FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    FnMiddleware { f }
}

#[async_trait]
impl<F> Middleware for FnMiddleware<F>
where
    F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult> + Send + Sync,
{
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        (self.f)(ctx, next).await
    }
}

/// A sub-application: an ordered, named list of middleware.
#[derive(Default)]
pub struct App {
    name: Option<String>,
    middleware: Vec<Arc<dyn Middleware>>,
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            middleware: Vec::new(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Append a stage.
    pub fn use_middleware(&mut self, middleware: impl IntoMiddleware) -> &mut Self {
        self.middleware.push(middleware.into_middleware());
        self
    }

    /// Append a closure stage.
    pub fn use_fn<F>(&mut self, f: F) -> &mut Self
    where
        F: for<'a> Fn(&'a mut Context, Next<'a>) -> BoxFuture<'a, HandlerResult>
            + Send
            + Sync
            + 'static,
    {
        self.use_middleware(from_fn(f))
    }

    /// Run the application against `ctx`.
    pub async fn call(&self, ctx: &mut Context) -> HandlerResult {
        Next::new(&self.middleware, None).run(ctx).await
    }
}

impl fmt::Debug for App {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("App")
            .field("name", &self.name)
            .field("len", &self.middleware.len())
            .finish()
    }
}

impl IntoMiddleware for App {
    fn into_middleware(self) -> Arc<dyn Middleware> {
        let mut composed = compose(self.middleware);
        if let Some(name) = self.name {
            composed.name = name;
        }
        Arc::new(composed)
    }
}
