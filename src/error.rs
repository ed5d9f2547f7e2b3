//! Error types shared across the crate.
//!
//! # Taxonomy
//! - `MountError`: raised while building a mount, never at request time
//! - `BoxError`: anything a handler fails with, propagated unchanged
//! - `HttpError`: a handler failure that carries the status to respond with
//!
//! Percent-decoding failures in captured segments are not errors at all;
//! the matcher falls back to the raw text.

use axum::http::StatusCode;
use thiserror::Error;

/// Type-erased error produced by middleware and handlers.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result type returned by every middleware in a pipeline.
pub type HandlerResult = Result<(), BoxError>;

/// Errors raised while constructing a mount.
#[derive(Debug, Error)]
pub enum MountError {
    #[error("mount path must begin with '/', got {0:?}")]
    InvalidPrefix(String),

    #[error("invalid path pattern {pattern:?} at offset {offset}: {reason}")]
    Pattern {
        pattern: String,
        offset: usize,
        reason: String,
    },

    #[error("pattern {pattern:?} did not compile: {source}")]
    Regex {
        pattern: String,
        #[source]
        source: Box<fancy_regex::Error>,
    },
}

/// A handler failure that maps onto a specific HTTP status.
#[derive(Debug, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: StatusCode,
    pub message: String,
}

impl HttpError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }
}
