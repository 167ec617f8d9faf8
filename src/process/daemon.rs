//! Daemonization.
//!
//! # Responsibilities
//! - Refuse to fork where a running scheduler makes it unsafe
//! - Detach from the controlling terminal (fork, setsid)
//! - Optionally change to `/`, redirect standard streams, write a PID file
//!
//! # Design Decisions
//! - Must run before the tokio runtime starts; on Darwin this is enforced
//! - Parent exits with status 0 as soon as the child exists

use std::fs;
use std::path::{Path, PathBuf};

use crate::platform::Platform;
use crate::process::types::{ProcessError, ProcessResult};
use crate::sys;

/// Options for [`daemonize`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonOptions {
    /// Keep stdin/stdout/stderr instead of redirecting them to `/dev/null`.
    pub noclose: bool,
    /// Keep the working directory instead of changing to `/`.
    pub nochdir: bool,
    /// Write the daemon's PID here after detaching.
    pub pid_file: Option<PathBuf>,
}

impl Default for DaemonOptions {
    fn default() -> Self {
        Self {
            noclose: false,
            nochdir: true,
            pid_file: None,
        }
    }
}

/// Whether a tokio runtime is entered on the calling thread.
pub fn scheduler_active() -> bool {
    tokio::runtime::Handle::try_current().is_ok()
}

/// Decide whether forking is allowed on `platform` in the given state.
pub fn check_fork_allowed(platform: Platform, scheduler_active: bool) -> ProcessResult<()> {
    if !platform.is_unix() {
        return Err(ProcessError::Unsupported {
            operation: "daemon",
            platform,
            reason: "the platform has no fork".into(),
        });
    }
    if scheduler_active && !platform.allows_fork_with_scheduler() {
        return Err(ProcessError::Unsupported {
            operation: "daemon",
            platform,
            reason: "fork is not supported once the task scheduler has started; \
                     daemonize before starting the runtime"
                .into(),
        });
    }
    Ok(())
}

/// Turn the calling process into a daemon.
///
/// Returns in the child only; the parent exits.
pub fn daemonize(options: &DaemonOptions) -> ProcessResult<()> {
    let active = scheduler_active();
    check_fork_allowed(Platform::current(), active)?;
    if active {
        tracing::warn!("Daemonizing inside a running runtime; its worker threads do not survive fork");
    }

    tracing::info!(
        noclose = options.noclose,
        nochdir = options.nochdir,
        "Detaching from controlling terminal"
    );
    sys::daemonize(options.noclose, options.nochdir)?;

    if let Some(path) = &options.pid_file {
        write_pid_file(path)?;
    }

    tracing::info!(pid = std::process::id(), "Daemonized");
    Ok(())
}

/// Write the current PID followed by a newline.
pub fn write_pid_file(path: &Path) -> ProcessResult<()> {
    fs::write(path, format!("{}\n", std::process::id()))
        .map_err(|e| ProcessError::os("write pid file", e))
}

/// Remove a PID file written by [`write_pid_file`]. A missing file is fine.
pub fn remove_pid_file(path: &Path) -> ProcessResult<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ProcessError::os("remove pid file", e)),
    }
}
