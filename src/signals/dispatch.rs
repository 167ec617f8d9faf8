//! Dispatcher thread and task pump.
//!
//! # Data Flow
//! ```text
//! OS signal → on_signal (async-signal-safe) → byte on self-pipe
//!     → dispatcher thread reads byte → looks up handler table
//!         Dispatch::Inline → run callback here, catch failure, report
//!         Dispatch::Task   → Job over mpsc → pump task → tokio::spawn
//! ```
//!
//! # Design Decisions
//! - No user code ever runs inside the real signal handler
//! - The dispatcher thread is the signal-handling context; inline callbacks
//!   delay later deliveries, task callbacks do not
//! - Submission failure (runtime gone) is counted and logged, not propagated

use std::any::Any;
use std::io::{ErrorKind, Read};
use std::os::unix::net::UnixStream;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::signals::reporter::ErrorReporter;
use crate::signals::types::{CallbackError, CallbackErrorKind, Dispatch, SignalHandler};

/// Byte that tells the dispatcher thread to exit. Signal 0 is never delivered.
pub(crate) const STOP: u8 = 0;

/// A registered callback.
#[derive(Clone)]
pub(crate) struct Registration {
    pub handler: SignalHandler,
    pub dispatch: Dispatch,
}

/// Signal number → registration. Last insert wins.
pub(crate) type HandlerTable = DashMap<i32, Registration>;

/// Delivery counters.
#[derive(Debug, Default)]
pub struct BridgeStats {
    delivered: AtomicU64,
    unhandled: AtomicU64,
    inline_failures: AtomicU64,
    task_failures: AtomicU64,
    dropped: AtomicU64,
}

/// Point-in-time copy of [`BridgeStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Deliveries that found a registered callback.
    pub delivered: u64,
    /// Deliveries for signals with no callback (e.g. just unregistered).
    pub unhandled: u64,
    /// Inline callbacks that returned an error or panicked.
    pub inline_failures: u64,
    /// Task callbacks that returned an error or panicked.
    pub task_failures: u64,
    /// Task submissions the scheduler could not accept.
    pub dropped: u64,
}

impl BridgeStats {
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            delivered: self.delivered.load(Ordering::Relaxed),
            unhandled: self.unhandled.load(Ordering::Relaxed),
            inline_failures: self.inline_failures.load(Ordering::Relaxed),
            task_failures: self.task_failures.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

/// A callback submitted to the task scheduler.
pub(crate) struct Job {
    signal: i32,
    handler: SignalHandler,
}

/// Owns the read end of the self-pipe and runs on its own thread.
pub(crate) struct Dispatcher {
    pub table: Arc<HandlerTable>,
    pub stats: Arc<BridgeStats>,
    pub reporter: Option<Arc<dyn ErrorReporter>>,
    pub tasks: Option<mpsc::UnboundedSender<Job>>,
}

impl Dispatcher {
    /// Read deliveries until the stop byte or end of stream.
    pub fn run(self, mut wake: UnixStream) {
        tracing::debug!("Signal dispatcher started");
        let mut buf = [0u8; 64];

        loop {
            let n = match wake.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::error!(error = %e, "Signal pipe read failed, dispatcher stopping");
                    break;
                }
            };

            for &byte in &buf[..n] {
                if byte == STOP {
                    tracing::debug!("Signal dispatcher stopping");
                    return;
                }
                self.dispatch(i32::from(byte));
            }
        }
    }

    fn dispatch(&self, signal: i32) {
        // Clone out so the shard lock is released before user code runs.
        let Some(registration) = self.table.get(&signal).map(|r| r.clone()) else {
            self.stats.unhandled.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(signal, "Signal delivered with no callback registered");
            return;
        };

        self.stats.delivered.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(signal, dispatch = %registration.dispatch, "Dispatching signal");

        match registration.dispatch {
            Dispatch::Inline => self.run_inline(signal, &registration.handler),
            Dispatch::Task => self.submit(signal, registration.handler),
        }
    }

    fn run_inline(&self, signal: i32, handler: &SignalHandler) {
        let Err(error) = invoke(signal, handler) else {
            return;
        };
        self.stats.inline_failures.fetch_add(1, Ordering::Relaxed);

        match &self.reporter {
            Some(reporter) => reporter.report(&error),
            None => {
                tracing::error!(
                    signal,
                    error = %error,
                    "Inline signal callback failed and no error reporter is configured, aborting"
                );
                std::process::abort();
            }
        }
    }

    fn submit(&self, signal: i32, handler: SignalHandler) {
        let submitted = self
            .tasks
            .as_ref()
            .is_some_and(|tasks| tasks.send(Job { signal, handler }).is_ok());

        if !submitted {
            self.stats.dropped.fetch_add(1, Ordering::Relaxed);
            tracing::warn!(signal, "Task scheduler unavailable, signal callback dropped");
        }
    }
}

/// Spawn every submitted job as its own task. Ends when the dispatcher exits.
pub(crate) async fn pump(mut jobs: mpsc::UnboundedReceiver<Job>, stats: Arc<BridgeStats>) {
    while let Some(job) = jobs.recv().await {
        let stats = stats.clone();
        tokio::spawn(async move {
            if let Err(error) = invoke(job.signal, &job.handler) {
                stats.task_failures.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(signal = job.signal, error = %error, "Signal callback task failed");
            }
        });
    }
    tracing::debug!("Signal task pump stopped");
}

/// Run a callback, turning both error returns and panics into `CallbackError`.
pub(crate) fn invoke(signal: i32, handler: &SignalHandler) -> Result<(), CallbackError> {
    match panic::catch_unwind(AssertUnwindSafe(|| handler(signal))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(CallbackError {
            signal,
            kind: CallbackErrorKind::Failed(e),
        }),
        Err(payload) => Err(CallbackError {
            signal,
            kind: CallbackErrorKind::Panicked(panic_message(payload.as_ref())),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
