//! Startup orchestration.
//!
//! Order: resolve config, initialize logging, then bind. Any failure here
//! is fatal and happens before a single connection is served.

use std::path::Path;

use thiserror::Error;

use crate::config::{load_config, validate_config, CaptureConfig, ConfigError};
use crate::net::{Listener, ListenerError};
use crate::observability::logging::LoggingError;

/// Fatal errors that stop the process before it serves anything.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("logging setup failed: {0}")]
    Logging(#[from] LoggingError),

    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("failed to install signal handlers: {0}")]
    Signal(#[source] std::io::Error),
}

/// Overrides applied on top of the file (or default) configuration.
#[derive(Debug, Default, Clone)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub read_timeout: Option<std::time::Duration>,
    pub log_level: Option<String>,
    pub log_format: Option<crate::config::LogFormat>,
}

/// Load `path` if given (defaults otherwise), apply overrides, validate.
pub fn resolve_config(path: Option<&Path>, overrides: ConfigOverrides) -> Result<CaptureConfig, ConfigError> {
    let mut config = match path {
        Some(path) => load_config(path)?,
        None => CaptureConfig::default(),
    };

    if let Some(bind_address) = overrides.bind_address {
        config.listener.bind_address = bind_address;
    }
    if let Some(read_timeout) = overrides.read_timeout {
        config.session.read_timeout = read_timeout;
    }
    if let Some(log_level) = overrides.log_level {
        config.observability.log_level = log_level;
    }
    if let Some(log_format) = overrides.log_format {
        config.observability.log_format = log_format;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Bind the listening socket, logging the failure if it cannot be created.
pub async fn bind_listener(config: &CaptureConfig) -> Result<Listener, StartupError> {
    Listener::bind(&config.listener).await.map_err(|e| {
        tracing::error!(
            address = %config.listener.bind_address,
            error = %e,
            "Failed to start TCP listener"
        );
        StartupError::from(e)
    })
}
