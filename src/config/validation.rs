//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check every mount prefix is rooted and compiles
//! - Validate value ranges (timeouts > 0, status codes valid)
//! - Detect duplicate mount names among siblings
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use axum::http::StatusCode;
use thiserror::Error;

use crate::config::schema::{MountConfig, ResponseConfig, ServerConfig};
use crate::routing::MountPath;

/// A single semantic problem in a configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("limits.max_body_bytes must be greater than zero")]
    ZeroBodyLimit,

    #[error("mount {mount:?}: {reason}")]
    Mount { mount: String, reason: String },

    #[error("mount {mount:?}: status {status} is not a valid HTTP status")]
    Status { mount: String, status: u16 },

    #[error("duplicate mount name {0:?}")]
    DuplicateName(String),
}

/// Validate a configuration, collecting every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(
            config.listener.bind_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout);
    }
    if config.limits.max_body_bytes == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    validate_mounts(&config.mounts, &mut errors);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_mounts(mounts: &[MountConfig], errors: &mut Vec<ValidationError>) {
    let mut names = HashSet::new();

    for mount in mounts {
        if let Some(name) = &mount.name {
            if !names.insert(name.as_str()) {
                errors.push(ValidationError::DuplicateName(name.clone()));
            }
        }

        if let Err(e) = MountPath::parse_with(&mount.prefix, mount.case_sensitive) {
            errors.push(ValidationError::Mount {
                mount: mount.display_name().to_string(),
                reason: e.to_string(),
            });
        }

        if let Some(ResponseConfig::Text { status, .. }) = &mount.response {
            if StatusCode::from_u16(*status).is_err() {
                errors.push(ValidationError::Status {
                    mount: mount.display_name().to_string(),
                    status: *status,
                });
            }
        }

        validate_mounts(&mount.mounts, errors);
    }
}
