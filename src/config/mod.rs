//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks, every mount prefix compiled once)
//!     → ServerConfig (validated, immutable)
//!     → handlers::build_app turns [[mounts]] into an App
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{
    ListenerConfig, LogFormat, MountConfig, ObservabilityConfig, ResponseConfig, ServerConfig,
};
pub use validation::{validate_config, ValidationError};
