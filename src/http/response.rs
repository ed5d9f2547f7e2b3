//! Response construction.
//!
//! # Responsibilities
//! - Turn a finished `Context` into an HTTP response
//! - Map pipeline failures to status codes
//!
//! # Design Decisions
//! - `HttpError` keeps its status; any other error is a 500
//! - Error details are logged, never sent to the client for a 500
//! - A request nobody answered is a plain-text 404

use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::{BoxError, HandlerResult, HttpError};
use crate::http::Context;

/// Build the response for a request that went through the pipeline.
pub fn into_response(mut ctx: Context, outcome: HandlerResult) -> Response {
    if let Err(err) = outcome {
        return error_response(&ctx, err);
    }

    let status = ctx.status();
    let body = match ctx.take_body() {
        Some(body) => body,
        None => {
            ctx.response_headers
                .entry(header::CONTENT_TYPE)
                .or_insert(HeaderValue::from_static("text/plain; charset=utf-8"));
            status
                .canonical_reason()
                .unwrap_or_default()
                .to_string()
                .into()
        }
    };

    let mut response = Response::new(Body::from(body));
    *response.status_mut() = status;
    response.headers_mut().extend(ctx.response_headers);
    response
}

fn error_response(ctx: &Context, err: BoxError) -> Response {
    let request_id = ctx.request_id.as_deref().unwrap_or("unknown");

    match err.downcast::<HttpError>() {
        Ok(http) => {
            tracing::warn!(
                request_id = %request_id,
                path = %ctx.original_path(),
                status = %http.status,
                "Request failed"
            );
            (http.status, http.message).into_response()
        }
        Err(err) => {
            tracing::error!(
                request_id = %request_id,
                path = %ctx.original_path(),
                error = %err,
                "Unhandled pipeline error"
            );
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
        }
    }
}
