//! The mount wrapper.
//!
//! # State Machine (per request)
//! ```text
//! UNMATCHED ──no match──▶ PASSTHROUGH        (next runs untouched)
//! UNMATCHED ──match─────▶ MOUNTED            (remainder + params installed)
//! MOUNTED ──next.run────▶ SUSPENDED          (outer path/params visible upstream)
//! SUSPENDED ──returns───▶ MOUNTED            (remainder + params re-installed)
//! MOUNTED ──downstream returns, fails or is dropped──▶ RESTORED
//! ```
//!
//! Every transition that installs a state is paired with a scope guard that
//! puts the previous one back, so restoration also happens on errors,
//! cancellation and unwinding.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, trace};

use crate::error::{HandlerResult, MountError};
use crate::http::Context;
use crate::middleware::{Continuation, IntoMiddleware, Middleware, Next};
use crate::mount::params::ParamSet;
use crate::routing::matcher::{Matcher, MountPath};

/// Options controlling how a mount rewrites the context.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MountOptions {
    /// Keep params captured by outer mounts, overridden by this mount's.
    pub merge_params: bool,
}

/// A binding of a path prefix to a downstream middleware or application.
///
/// Build one with [`Mount::new`], [`Mount::root`] or [`Mount::with_path`],
/// then add it to an [`App`](crate::middleware::App) or call
/// [`IntoMiddleware::into_middleware`].
pub struct Mount {
    path: MountPath,
    options: MountOptions,
    downstream: Arc<dyn Middleware>,
}

impl Mount {
    /// Mount `target` under a literal prefix or path pattern.
    pub fn new(prefix: &str, target: impl IntoMiddleware) -> Result<Self, MountError> {
        Ok(Self::with_path(MountPath::parse(prefix)?, target))
    }

    /// Mount `target` at `/`: pure composition, no rewriting.
    pub fn root(target: impl IntoMiddleware) -> Self {
        Self::with_path(MountPath::Root, target)
    }

    /// Mount `target` behind an already compiled matcher.
    pub fn with_matcher(
        source: impl Into<String>,
        matcher: impl Matcher + 'static,
        target: impl IntoMiddleware,
    ) -> Self {
        Self::with_path(MountPath::from_matcher(source, matcher), target)
    }

    pub fn with_path(path: MountPath, target: impl IntoMiddleware) -> Self {
        Self {
            path,
            options: MountOptions::default(),
            downstream: target.into_middleware(),
        }
    }

    pub fn merge_params(mut self, merge: bool) -> Self {
        self.options.merge_params = merge;
        self
    }

    pub fn options(mut self, options: MountOptions) -> Self {
        self.options = options;
        self
    }
}

impl fmt::Debug for Mount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mount")
            .field("path", &self.path.source())
            .field("options", &self.options)
            .field("downstream", &self.downstream.name())
            .finish()
    }
}

impl IntoMiddleware for Mount {
    fn into_middleware(self) -> Arc<dyn Middleware> {
        if self.path.is_root() {
            return self.downstream;
        }

        debug!(
            prefix = %self.path.source(),
            target = %self.downstream.name(),
            merge_params = self.options.merge_params,
            "mount"
        );

        let name = format!("mount {}", self.path.source());
        Arc::new(Mounted {
            name,
            path: self.path,
            options: self.options,
            downstream: self.downstream,
        })
    }
}

/// Shorthand for `Mount::new(prefix, target)?.into_middleware()`.
pub fn mount(prefix: &str, target: impl IntoMiddleware) -> Result<Arc<dyn Middleware>, MountError> {
    Ok(Mount::new(prefix, target)?.into_middleware())
}

/// The `(path, params)` pair a mount saves and installs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathState {
    pub path: String,
    pub params: ParamSet,
}

impl PathState {
    pub fn capture(ctx: &Context) -> Self {
        Self {
            path: ctx.path.clone(),
            params: ctx.params.clone(),
        }
    }

    fn apply(self, ctx: &mut Context) {
        ctx.path = self.path;
        ctx.params = self.params;
    }
}

/// Installs a state on entry and another one when dropped.
struct PathScope<'c> {
    ctx: &'c mut Context,
    on_exit: Option<PathState>,
}

impl<'c> PathScope<'c> {
    fn enter(ctx: &'c mut Context, state: PathState, on_exit: PathState) -> Self {
        state.apply(ctx);
        Self {
            ctx,
            on_exit: Some(on_exit),
        }
    }
}

impl Deref for PathScope<'_> {
    type Target = Context;

    fn deref(&self) -> &Context {
        self.ctx
    }
}

impl DerefMut for PathScope<'_> {
    fn deref_mut(&mut self) -> &mut Context {
        self.ctx
    }
}

impl Drop for PathScope<'_> {
    fn drop(&mut self) {
        if let Some(state) = self.on_exit.take() {
            state.apply(self.ctx);
        }
    }
}

/// The middleware a non-root mount turns into.
struct Mounted {
    name: String,
    path: MountPath,
    options: MountOptions,
    downstream: Arc<dyn Middleware>,
}

#[async_trait]
impl Middleware for Mounted {
    async fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let Some(found) = self.path.matches(&ctx.path) else {
            return next.run(ctx).await;
        };

        let params = if self.options.merge_params {
            ParamSet::merge(&ctx.params, &found.params)
        } else {
            found.params
        };
        let prev = PathState::capture(ctx);
        let mounted = PathState {
            path: found.remainder,
            params,
        };

        debug!(prev = %prev.path, path = %mounted.path, "enter");

        let resume = Resume {
            upstream: next,
            prev: prev.clone(),
            mounted: mounted.clone(),
        };
        let result = {
            let mut scope = PathScope::enter(ctx, mounted, prev);
            self.downstream
                .handle(&mut scope, Next::continuation(&resume))
                .await
        };

        debug!(path = %ctx.path, "leave");
        result
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Continuation handed to the downstream middleware: shows the outer state
/// to the rest of the outer pipeline, then brings the mounted state back.
struct Resume<'a> {
    upstream: Next<'a>,
    prev: PathState,
    mounted: PathState,
}

#[async_trait]
impl<'a> Continuation for Resume<'a> {
    async fn resume(&self, ctx: &mut Context) -> HandlerResult {
        trace!(path = %self.prev.path, "suspend");
        let mut scope = PathScope::enter(ctx, self.prev.clone(), self.mounted.clone());
        let result = self.upstream.run(&mut scope).await;
        drop(scope);
        trace!(path = %self.mounted.path, "resume");
        result
    }
}
