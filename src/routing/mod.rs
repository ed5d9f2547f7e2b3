//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Mount prefix (at startup):
//!     "/users/:id"
//!     → pattern.rs (tokenize, compile to anchored prefix regex + keys)
//!     → matcher.rs (MountPath, immutable, shared by every request)
//!
//! Incoming path:
//!     → matcher.rs (match prefix, strip it, decode captures)
//!     → Return: remainder + params, or no match
//! ```
//!
//! # Design Decisions
//! - Patterns compiled once per mount, immutable at runtime
//! - Matches respect segment boundaries (`/api` never matches `/apix`)
//! - Deterministic: same input always yields the same remainder and params

pub mod matcher;
pub mod pattern;

pub use matcher::{Matcher, MountPath, PathMatch, RawCaptures};
pub use pattern::PathPattern;
