//! Error reporting for inline signal callbacks.
//!
//! The reporter is injected when the bridge is built. Without one, an
//! inline callback failure is fatal to the process.

use crate::signals::types::CallbackError;

/// Receives failures raised by inline signal callbacks.
pub trait ErrorReporter: Send + Sync {
    /// Handle one callback failure. Runs on the dispatcher thread.
    fn report(&self, error: &CallbackError);
}

/// Reporter that logs failures through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl ErrorReporter for TracingReporter {
    fn report(&self, error: &CallbackError) {
        tracing::error!(
            signal = error.signal,
            error = %error,
            "Signal callback failed"
        );
    }
}

impl<F> ErrorReporter for F
where
    F: Fn(&CallbackError) + Send + Sync,
{
    fn report(&self, error: &CallbackError) {
        self(error)
    }
}
