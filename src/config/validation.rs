//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Resolve signal names and reject signals that cannot be caught
//! - Detect signals bound to both shutdown and reload
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ProcessConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashMap;
use std::str::FromStr;

use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::config::schema::ProcessConfig;
use crate::sys;

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("signals.{field}: {name} is not a known signal")]
    UnknownSignal { field: &'static str, name: String },

    #[error("signals.{field}: {name} cannot be caught")]
    Uncatchable { field: &'static str, name: String },

    #[error("{name} is listed in both signals.shutdown and signals.reload")]
    Overlap { name: String },

    #[error("signals.shutdown must list at least one signal")]
    NoShutdownSignal,

    #[error("observability.log_level: {0} is not a valid level")]
    LogLevel(String),

    #[error("process.title must be non-empty and free of NUL bytes")]
    Title,
}

/// Validate a configuration.
pub fn validate_config(config: &ProcessConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.signals.shutdown.is_empty() {
        errors.push(ValidationError::NoShutdownSignal);
    }

    let shutdown = resolve_signals("shutdown", &config.signals.shutdown, &mut errors);
    let reload = resolve_signals("reload", &config.signals.reload, &mut errors);
    for (signal, name) in &reload {
        if shutdown.contains_key(signal) {
            errors.push(ValidationError::Overlap { name: name.clone() });
        }
    }

    if LevelFilter::from_str(&config.observability.log_level).is_err() {
        errors.push(ValidationError::LogLevel(
            config.observability.log_level.clone(),
        ));
    }

    if let Some(title) = &config.process.title {
        if title.is_empty() || title.contains('\0') {
            errors.push(ValidationError::Title);
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Signal numbers for a list of names. Call only on validated configs.
pub fn signal_numbers(names: &[String]) -> Vec<i32> {
    names
        .iter()
        .filter_map(|name| sys::parse_signal(name).ok())
        .collect()
}

fn resolve_signals(
    field: &'static str,
    names: &[String],
    errors: &mut Vec<ValidationError>,
) -> HashMap<i32, String> {
    let mut resolved = HashMap::new();
    for name in names {
        match sys::parse_signal(name) {
            Ok(signal) => {
                if sys::validate_catchable(signal).is_err() {
                    errors.push(ValidationError::Uncatchable {
                        field,
                        name: name.clone(),
                    });
                } else {
                    resolved.insert(signal, name.clone());
                }
            }
            Err(_) => errors.push(ValidationError::UnknownSignal {
                field,
                name: name.clone(),
            }),
        }
    }
    resolved
}
