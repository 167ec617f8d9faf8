//! Structured logging.
//!
//! # Responsibilities
//! - Initialize logging subsystem
//! - Configure log level at runtime (config reload)
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the configured level at startup
//! - Events go to stderr; stdout carries command output only
//! - The filter sits behind a reload layer so SIGHUP can change it

use thiserror::Error;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, reload, util::SubscriberInitExt, EnvFilter, Registry,
};

/// Errors from logging setup.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("Invalid log level: {0}")]
    InvalidLevel(String),

    #[error("Failed to install subscriber: {0}")]
    Init(String),

    #[error("Failed to reload log filter: {0}")]
    Reload(String),
}

/// Handle for changing the log level after initialization.
#[derive(Clone)]
pub struct LogHandle {
    handle: reload::Handle<EnvFilter, Registry>,
}

impl LogHandle {
    /// Replace the active filter with one for `level`.
    pub fn set_level(&self, level: &str) -> Result<(), LoggingError> {
        let filter = filter_for(level)?;
        self.handle
            .reload(filter)
            .map_err(|e| LoggingError::Reload(e.to_string()))?;
        tracing::info!(level, "Log level changed");
        Ok(())
    }
}

/// Filter that applies `level` to this crate and `warn` to dependencies.
pub fn filter_for(level: &str) -> Result<EnvFilter, LoggingError> {
    EnvFilter::try_new(format!("warn,procctl={level}"))
        .map_err(|_| LoggingError::InvalidLevel(level.to_string()))
}

/// Install the global subscriber.
pub fn init(level: &str) -> Result<LogHandle, LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => filter_for(level)?,
    };
    let (filter, handle) = reload::Layer::new(filter);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .map_err(|e| LoggingError::Init(e.to_string()))?;

    Ok(LogHandle { handle })
}
