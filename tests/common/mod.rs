//! Shared utilities for integration tests.

#![allow(dead_code)]

use axum::http::{Method, StatusCode};
use siren_mount::{from_fn, App, Context, IntoMiddleware};

/// Outcome of one request run through an app.
#[derive(Debug)]
pub struct Outcome {
    pub status: StatusCode,
    pub body: String,
    pub path: String,
    pub params_empty: bool,
}

/// Run a GET for `target` through `app` and collect what the client would see.
pub async fn get(app: &App, target: &str) -> Outcome {
    let mut ctx = Context::new(Method::GET, target);
    app.call(&mut ctx)
        .await
        .unwrap_or_else(|e| panic!("request to {target} failed: {e}"));
    Outcome {
        status: ctx.status(),
        body: ctx.body_text().unwrap_or_default().to_string(),
        path: ctx.path.clone(),
        params_empty: ctx.params.is_empty(),
    }
}

/// Middleware that answers 204 and stops.
pub fn no_content() -> impl IntoMiddleware {
    from_fn(|ctx, _next| {
        Box::pin(async move {
            ctx.set_status(StatusCode::NO_CONTENT);
            Ok(())
        })
    })
}

/// Middleware that appends `label` to the body, then continues.
pub fn append(label: &'static str) -> impl IntoMiddleware {
    from_fn(move |ctx, next| {
        Box::pin(async move {
            ctx.append_body(label);
            next.run(ctx).await
        })
    })
}

/// Middleware that continues, then prepends `label` to the body.
pub fn prepend_after(label: &'static str) -> impl IntoMiddleware {
    from_fn(move |ctx, next| {
        Box::pin(async move {
            next.run(ctx).await?;
            ctx.prepend_body(label);
            Ok(())
        })
    })
}
