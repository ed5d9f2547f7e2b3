//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events (mount/enter/leave, dispatch, errors)
//!     → logging.rs (subscriber: filter + pretty or JSON output)
//!
//! Consumers:
//!     → stdout, collected by whatever runs the process
//! ```
//!
//! # Design Decisions
//! - Structured fields, not formatted strings
//! - Request ID (from the request-id layer) attached to request events
//! - Mount enter/leave events at debug level, suspend/resume at trace

pub mod logging;

pub use logging::init_logging;
