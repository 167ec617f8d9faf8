//! Process control error definitions.

use std::io;
use thiserror::Error;

use crate::platform::Platform;

/// Boxed error returned by user callbacks.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors that can occur during process control operations.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// Operation not available on the current platform or in the current state.
    #[error("{operation} is not supported on {platform}: {reason}")]
    Unsupported {
        operation: &'static str,
        platform: Platform,
        reason: String,
    },

    /// The underlying syscall reported failure.
    #[error("{operation} failed: {source}")]
    Os {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    /// Number does not name a signal on this platform.
    #[error("Invalid signal number: {0}")]
    InvalidSignal(i32),

    /// Name does not match any known signal.
    #[error("Unknown signal name: {0}")]
    UnknownSignal(String),

    /// Task dispatch requested without a runtime to submit to.
    #[error("No task scheduler available for coroutine dispatch")]
    SchedulerUnavailable,

    /// Another signal bridge owns the process-wide disposition table.
    #[error("A signal bridge is already installed in this process")]
    AlreadyInstalled,

    /// The bridge was shut down and no longer accepts registrations.
    #[error("Signal bridge has been shut down")]
    BridgeClosed,
}

impl ProcessError {
    /// Wrap a syscall failure.
    pub fn os(operation: &'static str, source: impl Into<io::Error>) -> Self {
        ProcessError::Os {
            operation,
            source: source.into(),
        }
    }

    /// Build an unsupported error for the current platform.
    pub fn unsupported(operation: &'static str, reason: impl Into<String>) -> Self {
        ProcessError::Unsupported {
            operation,
            platform: Platform::current(),
            reason: reason.into(),
        }
    }

    /// The errno behind an `Os` error, if any.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            ProcessError::Os { source, .. } => source.raw_os_error(),
            _ => None,
        }
    }

    /// True for platform or state refusals rather than real failures.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ProcessError::Unsupported { .. })
    }
}

/// Result type for process control operations.
pub type ProcessResult<T> = Result<T, ProcessError>;
