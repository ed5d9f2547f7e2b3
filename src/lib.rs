//! Path mounting for koa-style middleware pipelines.
//!
//! A mount delegates a sub-range of request paths to a nested application
//! or a single middleware, rewriting `ctx.path` (and `ctx.params`) for the
//! duration of the delegation and restoring them afterwards.

pub mod config;
pub mod error;
pub mod handlers;
pub mod http;
pub mod lifecycle;
pub mod middleware;
pub mod mount;
pub mod observability;
pub mod routing;

pub use config::schema::ServerConfig;
pub use error::{BoxError, HandlerResult, HttpError, MountError};
pub use http::{Context, HttpServer};
pub use lifecycle::Shutdown;
pub use middleware::{compose, from_fn, App, IntoMiddleware, Middleware, Next};
pub use mount::{mount, Mount, MountOptions, ParamKey, ParamSet};
pub use routing::{Matcher, MountPath, PathPattern};
