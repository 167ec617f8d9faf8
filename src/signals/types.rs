//! Signal callback types and callback failure definitions.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::process::types::BoxError;

/// User callback invoked with the delivered signal number.
pub type SignalHandler = Arc<dyn Fn(i32) -> Result<(), BoxError> + Send + Sync>;

/// Wrap a closure as a [`SignalHandler`].
pub fn handler<F>(f: F) -> SignalHandler
where
    F: Fn(i32) -> Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Where a callback runs when its signal arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Submit to the task scheduler as a new task. The dispatcher never waits.
    #[default]
    Task,
    /// Run on the dispatcher thread before the next delivery is handled.
    Inline,
}

impl From<bool> for Dispatch {
    /// `true` selects coroutine (task) dispatch.
    fn from(enable_coroutine: bool) -> Self {
        if enable_coroutine {
            Dispatch::Task
        } else {
            Dispatch::Inline
        }
    }
}

impl fmt::Display for Dispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dispatch::Task => f.write_str("task"),
            Dispatch::Inline => f.write_str("inline"),
        }
    }
}

/// A callback failed while handling a signal.
#[derive(Debug, Error)]
#[error("callback for signal {signal} {kind}")]
pub struct CallbackError {
    /// Signal whose callback failed.
    pub signal: i32,
    /// How it failed.
    #[source]
    pub kind: CallbackErrorKind,
}

/// Failure mode of a signal callback.
#[derive(Debug, Error)]
pub enum CallbackErrorKind {
    /// The callback returned an error.
    #[error("failed: {0}")]
    Failed(BoxError),

    /// The callback panicked; holds the panic message.
    #[error("panicked: {0}")]
    Panicked(String),
}
