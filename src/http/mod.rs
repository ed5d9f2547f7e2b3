//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request ID, tracing, timeout, body limit)
//!     → request.rs (build Context from the request)
//!     → middleware pipeline (mounts rewrite ctx.path / ctx.params)
//!     → response.rs (Context → response, errors → status codes)
//!     → Send to client
//! ```

pub mod context;
pub mod request;
pub mod response;
pub mod server;

pub use context::Context;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
