//! Terminal handlers and app assembly from configuration.
//!
//! # Responsibilities
//! - `echo`: report the active path, original path and params as JSON
//! - `text`: respond with fixed text and status
//! - Turn a `[[mounts]]` table into a tree of mounted sub-apps
//!
//! # Design Decisions
//! - Nested mounts are added before the mount's own response, so the
//!   response only runs when no nested mount answered
//! - Terminal handlers never call `next`

use async_trait::async_trait;
use axum::http::{header, HeaderValue, StatusCode};
use serde_json::json;

use crate::config::{MountConfig, ResponseConfig};
use crate::error::{HandlerResult, MountError};
use crate::http::Context;
use crate::middleware::{App, Middleware, Next};
use crate::mount::{Mount, MountOptions};
use crate::routing::MountPath;

/// Responds with a JSON view of the request as the mount sees it.
#[derive(Debug, Clone, Copy, Default)]
pub struct Echo;

#[async_trait]
impl Middleware for Echo {
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>) -> HandlerResult {
        let body = serde_json::to_vec(&json!({
            "method": ctx.method.as_str(),
            "path": ctx.path,
            "original_path": ctx.original_path(),
            "params": ctx.params,
        }))?;
        ctx.response_headers
            .insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        ctx.set_body(body);
        Ok(())
    }

    fn name(&self) -> &str {
        "echo"
    }
}

/// Responds with fixed text.
#[derive(Debug, Clone)]
pub struct Text {
    status: StatusCode,
    body: String,
}

impl Text {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

#[async_trait]
impl Middleware for Text {
    async fn handle(&self, ctx: &mut Context, _next: Next<'_>) -> HandlerResult {
        ctx.set_status(self.status);
        ctx.response_headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        ctx.set_body(self.body.clone());
        Ok(())
    }

    fn name(&self) -> &str {
        "text"
    }
}

/// Build the root app from a mount table.
pub fn build_app(mounts: &[MountConfig]) -> Result<App, MountError> {
    let mut app = App::named("root");
    for config in mounts {
        app.use_middleware(build_mount(config)?);
    }
    Ok(app)
}

fn build_mount(config: &MountConfig) -> Result<Mount, MountError> {
    let mut sub = App::named(config.display_name());
    for child in &config.mounts {
        sub.use_middleware(build_mount(child)?);
    }

    match &config.response {
        Some(ResponseConfig::Echo) => {
            sub.use_middleware(Echo);
        }
        Some(ResponseConfig::Text { body, status }) => {
            // Validation rejects bad codes; fall back rather than fail here.
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::OK);
            sub.use_middleware(Text::new(status, body.clone()));
        }
        None => {}
    }

    let path = MountPath::parse_with(&config.prefix, config.case_sensitive)?;
    Ok(Mount::with_path(path, sub).options(MountOptions {
        merge_params: config.merge_params,
    }))
}
