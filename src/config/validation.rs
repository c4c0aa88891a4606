//! Configuration validation.
//!
//! Serde handles syntax; this module checks values. Every problem is
//! reported, not just the first one found.

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::CaptureConfig;

/// Largest accepted per-session read buffer.
pub const MAX_BUFFER_SIZE: usize = 1024 * 1024;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address {0:?} is not a socket address")]
    BindAddress(String),

    #[error("session.read_timeout must be greater than zero")]
    ZeroReadTimeout,

    #[error("session.buffer_size must be between 1 and {max}, got {0}", max = MAX_BUFFER_SIZE)]
    BufferSize(usize),

    #[error("observability.metrics_address {0:?} is not a socket address")]
    MetricsAddress(String),
}

/// Check a configuration, returning every violation found.
pub fn validate_config(config: &CaptureConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.socket_addr().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.session.read_timeout.is_zero() {
        errors.push(ValidationError::ZeroReadTimeout);
    }

    let buffer_size = config.session.buffer_size;
    if buffer_size == 0 || buffer_size > MAX_BUFFER_SIZE {
        errors.push(ValidationError::BufferSize(buffer_size));
    }

    let observability = &config.observability;
    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::MetricsAddress(observability.metrics_address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
