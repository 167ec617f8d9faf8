//! Process-wide signal bridge.
//!
//! # Responsibilities
//! - Own the process-wide signal-disposition table
//! - Install and remove OS handlers as callbacks are registered and cleared
//! - Start and stop the dispatcher thread and task pump
//!
//! # Design Decisions
//! - One bridge per process: `install` fails while another is live
//! - `install` starts with an empty table; `shutdown` restores `SIG_DFL` for
//!   every registered signal
//! - Last registration for a signal wins; callers must not race each other
//! - A batch is validated before any disposition changes. An OS failure
//!   mid-batch leaves earlier signals of the batch registered.
//! - Callbacks that capture the bridge keep it alive until `shutdown`

use std::io::Write;
use std::os::unix::io::AsRawFd;
use std::os::unix::net::UnixStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use tokio::runtime::Handle;
use tokio::sync::mpsc;

use crate::process::types::{ProcessError, ProcessResult};
use crate::signals::dispatch::{
    pump, BridgeStats, Dispatcher, HandlerTable, Registration, StatsSnapshot, STOP,
};
use crate::signals::reporter::ErrorReporter;
use crate::signals::types::{Dispatch, SignalHandler};
use crate::sys;

/// Set while a bridge owns the OS handlers.
static INSTALLED: AtomicBool = AtomicBool::new(false);

/// Handle to the installed signal bridge. Cheap to clone.
#[derive(Clone)]
pub struct SignalBridge {
    inner: Arc<Inner>,
}

struct Inner {
    table: Arc<HandlerTable>,
    stats: Arc<BridgeStats>,
    waker: UnixStream,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
    task_dispatch: bool,
}

/// Builder for [`SignalBridge`].
#[derive(Default)]
pub struct SignalBridgeBuilder {
    runtime: Option<Handle>,
    reporter: Option<Arc<dyn ErrorReporter>>,
}

impl SignalBridgeBuilder {
    /// Runtime that task-dispatched callbacks are spawned on.
    ///
    /// Defaults to the runtime entered on the installing thread, if any.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// Reporter for inline callback failures.
    pub fn reporter(mut self, reporter: impl ErrorReporter + 'static) -> Self {
        self.reporter = Some(Arc::new(reporter));
        self
    }

    /// Claim the process-wide table and start the dispatcher.
    pub fn install(self) -> ProcessResult<SignalBridge> {
        if INSTALLED
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ProcessError::AlreadyInstalled);
        }

        self.start().inspect_err(|_| INSTALLED.store(false, Ordering::Release))
    }

    fn start(self) -> ProcessResult<SignalBridge> {
        let (reader, waker) =
            UnixStream::pair().map_err(|e| ProcessError::os("socketpair", e))?;
        waker
            .set_nonblocking(true)
            .map_err(|e| ProcessError::os("set_nonblocking", e))?;

        let table = Arc::new(HandlerTable::new());
        let stats = Arc::new(BridgeStats::default());

        let runtime = self.runtime.or_else(|| Handle::try_current().ok());
        let task_dispatch = runtime.is_some();
        let tasks = runtime.map(|handle| {
            let (tx, rx) = mpsc::unbounded_channel();
            handle.spawn(pump(rx, stats.clone()));
            tx
        });

        let dispatcher = Dispatcher {
            table: table.clone(),
            stats: stats.clone(),
            reporter: self.reporter,
            tasks,
        };
        let has_reporter = dispatcher.reporter.is_some();

        let worker = thread::Builder::new()
            .name("signal-dispatch".into())
            .spawn(move || dispatcher.run(reader))
            .map_err(|e| ProcessError::os("spawn dispatcher", e))?;

        sys::set_wake_fd(waker.as_raw_fd());

        tracing::info!(task_dispatch, has_reporter, "Signal bridge installed");

        Ok(SignalBridge {
            inner: Arc::new(Inner {
                table,
                stats,
                waker,
                worker: Mutex::new(Some(worker)),
                closed: AtomicBool::new(false),
                task_dispatch,
            }),
        })
    }
}

impl SignalBridge {
    /// Start configuring a bridge.
    pub fn builder() -> SignalBridgeBuilder {
        SignalBridgeBuilder::default()
    }

    /// Install with defaults: current runtime (if any), no error reporter.
    pub fn install() -> ProcessResult<Self> {
        Self::builder().install()
    }

    /// Bind every signal in `signals` to `handler`.
    pub fn register(
        &self,
        signals: &[i32],
        handler: SignalHandler,
        dispatch: Dispatch,
    ) -> ProcessResult<()> {
        self.ensure_open()?;
        if dispatch == Dispatch::Task && !self.inner.task_dispatch {
            return Err(ProcessError::SchedulerUnavailable);
        }
        for &signal in signals {
            sys::validate_catchable(signal)?;
        }

        for &signal in signals {
            let previous = self.inner.table.insert(
                signal,
                Registration {
                    handler: handler.clone(),
                    dispatch,
                },
            );

            if let Err(e) = sys::install_handler(signal) {
                match previous {
                    Some(previous) => {
                        self.inner.table.insert(signal, previous);
                    }
                    None => {
                        self.inner.table.remove(&signal);
                    }
                }
                tracing::warn!(signal, error = %e, "Failed to install signal handler");
                return Err(e);
            }

            tracing::debug!(
                signal,
                name = sys::signal_name(signal).unwrap_or("?"),
                %dispatch,
                replaced = previous.is_some(),
                "Signal handler registered"
            );
        }
        Ok(())
    }

    /// Restore the default disposition for every registered signal in `signals`.
    ///
    /// Signals without a callback are not an error and keep whatever
    /// disposition they have.
    pub fn unregister(&self, signals: &[i32]) -> ProcessResult<()> {
        self.ensure_open()?;
        for &signal in signals {
            sys::validate_catchable(signal)?;
        }

        for &signal in signals {
            if !self.inner.table.contains_key(&signal) {
                continue;
            }
            sys::restore_default(signal)?;
            if self.inner.table.remove(&signal).is_some() {
                tracing::debug!(signal, "Signal handler removed");
            }
        }
        Ok(())
    }

    /// Register `handler`, or unregister when it is `None`.
    pub fn set(
        &self,
        signals: &[i32],
        handler: Option<SignalHandler>,
        dispatch: Dispatch,
    ) -> ProcessResult<()> {
        match handler {
            Some(handler) => self.register(signals, handler, dispatch),
            None => self.unregister(signals),
        }
    }

    /// Whether `signal` currently has a callback.
    pub fn is_registered(&self, signal: i32) -> bool {
        self.inner.table.contains_key(&signal)
    }

    /// Registered signal numbers, ascending.
    pub fn registered(&self) -> Vec<i32> {
        let mut signals: Vec<i32> = self.inner.table.iter().map(|e| *e.key()).collect();
        signals.sort_unstable();
        signals
    }

    /// Whether task dispatch is available.
    pub fn supports_task_dispatch(&self) -> bool {
        self.inner.task_dispatch
    }

    /// Current delivery counters.
    pub fn stats(&self) -> StatsSnapshot {
        self.inner.stats.snapshot()
    }

    /// False once `shutdown` has run.
    pub fn is_open(&self) -> bool {
        !self.inner.closed.load(Ordering::Acquire)
    }

    /// Restore default dispositions, stop the dispatcher and release the
    /// process-wide slot. Idempotent.
    pub fn shutdown(&self) {
        self.inner.teardown();
    }

    fn ensure_open(&self) -> ProcessResult<()> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ProcessError::BridgeClosed)
        }
    }
}

impl Inner {
    fn teardown(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let signals: Vec<i32> = self.table.iter().map(|e| *e.key()).collect();
        for signal in signals {
            if let Err(e) = sys::restore_default(signal) {
                tracing::warn!(signal, error = %e, "Failed to restore default disposition");
            }
        }
        // No handler writes to the waker once this returns.
        sys::clear_wake_fd();
        self.table.clear();

        let stopped = self
            .waker
            .set_nonblocking(false)
            .and_then(|_| (&self.waker).write_all(&[STOP]));
        if let Err(e) = stopped {
            tracing::warn!(error = %e, "Failed to wake signal dispatcher for shutdown");
        }

        let worker = self.worker.lock().ok().and_then(|mut w| w.take());
        if let Some(worker) = worker {
            // Shutdown may be requested from an inline callback on the worker itself.
            if worker.thread().id() != thread::current().id() && worker.join().is_err() {
                tracing::warn!("Signal dispatcher thread panicked");
            }
        }

        INSTALLED.store(false, Ordering::Release);
        tracing::info!("Signal bridge shut down");
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.teardown();
    }
}
