//! Request handling.
//!
//! # Responsibilities
//! - Build a `Context` from an incoming request
//! - Carry the request ID assigned by the request-id layer
//!
//! # Design Decisions
//! - The path is kept exactly as received (no decoding); mounts decode
//!   only the segments they capture
//! - Request IDs are generated by `tower-http` before this point

use axum::body::Bytes;
use axum::http::request::Parts;

use crate::http::Context;

/// Header carrying the request ID.
pub const X_REQUEST_ID: &str = "x-request-id";

/// Build a context from the head of a request and its buffered body.
pub fn context_from_parts(parts: &Parts, body: Bytes) -> Context {
    let target = parts
        .uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    let mut ctx = Context::new(parts.method.clone(), target);
    ctx.request_headers = parts.headers.clone();
    ctx.request_body = body;
    ctx.request_id = parts
        .headers
        .get(X_REQUEST_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    ctx
}
