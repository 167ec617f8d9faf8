//! `procctl run` orchestration.
//!
//! # Responsibilities
//! - Daemonize (before any runtime exists) and set the process title
//! - Install the signal bridge and bind shutdown/reload signals
//! - Write the PID file once ready for signals
//! - Wait for shutdown, then restore default dispositions
//!
//! # Design Decisions
//! - Ordered startup: daemon, title, runtime, bridge, handlers
//! - Reload failures keep the current configuration

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::broadcast::error::RecvError;

use crate::config::validation::signal_numbers;
use crate::config::{load_config, ConfigError, ProcessConfig};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::LogHandle;
use crate::process::daemon::{remove_pid_file, write_pid_file, DaemonOptions};
use crate::process::{BoxError, ProcessControl, ProcessError};
use crate::signals::{handler, signal_name, Dispatch, SignalBridge, TracingReporter};

/// Errors that stop `run` before or during startup.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Process(#[from] ProcessError),

    #[error("Failed to start runtime: {0}")]
    Runtime(#[source] std::io::Error),
}

/// Runs the process until a shutdown signal arrives.
pub struct Runner {
    config: ProcessConfig,
    source: Option<PathBuf>,
    logging: Option<LogHandle>,
}

impl Runner {
    /// `source` is the file reloaded on reload signals, if any.
    pub fn new(config: ProcessConfig, source: Option<PathBuf>) -> Self {
        Self {
            config,
            source,
            logging: None,
        }
    }

    /// Let reloads change the log level through `handle`.
    pub fn with_logging(mut self, handle: LogHandle) -> Self {
        self.logging = Some(handle);
        self
    }

    /// Full lifecycle on the calling (main) thread. Returns the signal that
    /// stopped the process.
    pub fn run(self) -> Result<i32, RunError> {
        if self.config.daemon.enabled {
            // The PID file doubles as a readiness marker, so serve writes it.
            let options = DaemonOptions {
                pid_file: None,
                ..self.config.daemon.options()
            };
            ProcessControl::daemon_with(&options)?;
        }

        if let Some(title) = &self.config.process.title {
            if ProcessControl::set_title(title) {
                tracing::info!(title = %title, "Process title set");
            } else {
                tracing::warn!(title = %title, "Process title not supported here, continuing");
            }
        }

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(RunError::Runtime)?;

        runtime.block_on(async {
            match SignalBridge::builder().reporter(TracingReporter).install() {
                Ok(bridge) => self.serve(bridge).await,
                Err(e) => Err(RunError::from(e)),
            }
        })
    }

    /// Bind configured signals on `bridge` and wait for shutdown.
    ///
    /// The PID file, if configured, is written once the signals are bound
    /// and removed again after the bridge is shut down.
    pub async fn serve(&self, bridge: SignalBridge) -> Result<i32, RunError> {
        let control = ProcessControl::new(bridge);
        let coroutine = self.config.signals.dispatch == Dispatch::Task;

        let shutdown = Arc::new(Shutdown::new());
        let mut stop = shutdown.subscribe();

        let pid_file = self.config.daemon.pid_file.as_deref();
        let ready = self
            .bind(&control, shutdown, coroutine)
            .and_then(|_| pid_file.map_or(Ok(()), write_pid_file));
        if let Err(e) = ready {
            control.bridge().shutdown();
            return Err(e.into());
        }

        tracing::info!(
            pid = ProcessControl::get_pid(),
            dispatch = %self.config.signals.dispatch,
            "Running, waiting for signals"
        );

        let signal = loop {
            match stop.recv().await {
                Ok(signal) => break signal,
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break 0,
            }
        };

        tracing::info!(
            signal,
            name = signal_name(signal).unwrap_or("?"),
            "Shutdown requested"
        );
        control.bridge().shutdown();

        if let Some(path) = pid_file {
            if let Err(e) = remove_pid_file(path) {
                tracing::warn!(error = %e, "Failed to remove PID file");
            }
        }
        Ok(signal)
    }

    fn bind(
        &self,
        control: &ProcessControl,
        shutdown: Arc<Shutdown>,
        coroutine: bool,
    ) -> Result<(), ProcessError> {
        let shutdown_signals = signal_numbers(&self.config.signals.shutdown);
        control.register_signal_handlers(
            &shutdown_signals,
            Some(handler(move |signal| {
                shutdown.trigger(signal);
                Ok(())
            })),
            coroutine,
        )?;

        let reload_signals = signal_numbers(&self.config.signals.reload);
        if !reload_signals.is_empty() {
            let reloader = Reloader {
                source: self.source.clone(),
                logging: self.logging.clone(),
            };
            control.register_signal_handlers(
                &reload_signals,
                Some(handler(move |signal| reloader.reload(signal))),
                coroutine,
            )?;
        }
        Ok(())
    }
}

struct Reloader {
    source: Option<PathBuf>,
    logging: Option<LogHandle>,
}

impl Reloader {
    fn reload(&self, signal: i32) -> Result<(), BoxError> {
        let Some(path) = &self.source else {
            tracing::info!(signal, "Reload requested but no config file was given");
            return Ok(());
        };

        let config = load_config(path)?;
        if let Some(logging) = &self.logging {
            logging.set_level(&config.observability.log_level)?;
        }
        tracing::info!(signal, path = %path.display(), "Configuration reloaded");
        Ok(())
    }
}
