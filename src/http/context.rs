//! Per-request context.
//!
//! # Responsibilities
//! - Carry the active path and params seen by the current middleware
//! - Keep the original request path for logging and responses
//! - Accumulate the response (status, headers, body)
//!
//! # Design Decisions
//! - One `Context` per request, passed by `&mut` through the pipeline
//! - `path` and `params` are public fields; mounts rewrite them in place
//! - The status defaults to 404 and becomes 200 once a body is set

use axum::body::Bytes;
use axum::http::{HeaderMap, Method, StatusCode};

use crate::mount::params::ParamSet;

/// Mutable state of a single request as it moves through the pipeline.
#[derive(Debug, Clone)]
pub struct Context {
    pub method: Method,
    /// Path visible to the current middleware. Rewritten by mounts.
    pub path: String,
    /// Params captured by the mounts currently in effect.
    pub params: ParamSet,
    pub query: Option<String>,
    pub request_headers: HeaderMap,
    pub request_body: Bytes,
    pub request_id: Option<String>,
    pub response_headers: HeaderMap,
    original_path: String,
    status: Option<StatusCode>,
    body: Option<Bytes>,
}

impl Context {
    /// Create a context for `target`, a path with an optional query string.
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, Some(query.to_string())),
            None => (target, None),
        };
        let path = if path.is_empty() { "/" } else { path };

        Self {
            method,
            path: path.to_string(),
            params: ParamSet::new(),
            query,
            request_headers: HeaderMap::new(),
            request_body: Bytes::new(),
            request_id: None,
            response_headers: HeaderMap::new(),
            original_path: path.to_string(),
            status: None,
            body: None,
        }
    }

    /// The path the request arrived with, before any mount rewrote it.
    pub fn original_path(&self) -> &str {
        &self.original_path
    }

    pub fn status(&self) -> StatusCode {
        match (self.status, &self.body) {
            (Some(status), _) => status,
            (None, Some(_)) => StatusCode::OK,
            (None, None) => StatusCode::NOT_FOUND,
        }
    }

    pub fn set_status(&mut self, status: StatusCode) {
        self.status = Some(status);
    }

    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body as text, if it is set and valid UTF-8.
    pub fn body_text(&self) -> Option<&str> {
        self.body
            .as_ref()
            .and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn set_body(&mut self, body: impl Into<Bytes>) {
        self.body = Some(body.into());
    }

    /// Append text to the body, starting a new one if there is none.
    pub fn append_body(&mut self, text: &str) {
        let mut buf = self.body.take().map(|b| b.to_vec()).unwrap_or_default();
        buf.extend_from_slice(text.as_bytes());
        self.body = Some(Bytes::from(buf));
    }

    /// Prepend text to the body, starting a new one if there is none.
    pub fn prepend_body(&mut self, text: &str) {
        let mut buf = text.as_bytes().to_vec();
        if let Some(body) = self.body.take() {
            buf.extend_from_slice(&body);
        }
        self.body = Some(Bytes::from(buf));
    }

    pub fn take_body(&mut self) -> Option<Bytes> {
        self.body.take()
    }
}
