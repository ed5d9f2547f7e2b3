//! Path mounting subsystem.
//!
//! # Data Flow
//! ```text
//! Mount Construction:
//!     prefix ("/api/:version" | "/" | compiled matcher)
//!     → routing::MountPath (compiled once, immutable)
//!     → target composed into one middleware
//!     → root mount: the target itself; otherwise the mount wrapper
//!
//! Per Request:
//!     ctx.path (as left by any enclosing mount)
//!     → MountPath::matches → remainder + params, or pass through
//!     → install remainder/params, run downstream
//!     → downstream calls next: outer state shown upstream, then re-installed
//!     → downstream finishes: outer state restored
//! ```
//!
//! # Design Decisions
//! - Mounts match the current path, so nested mounts strip successive prefixes
//! - Without `merge_params`, a mount replaces the params it inherited
//! - Save/restore is strictly LIFO and tied to scope exit

pub mod params;
pub mod wrapper;

pub use params::{ParamKey, ParamSet};
pub use wrapper::{mount, Mount, MountOptions, PathState};
