//! `ProcessControl` facade.

use std::io::ErrorKind;

#[cfg(unix)]
use crate::signals::{Dispatch, SignalBridge, SignalHandler};

use crate::process::daemon::{self, DaemonOptions};
use crate::process::title;
use crate::process::types::{ProcessError, ProcessResult};
use crate::sys;

/// OS-facing process operations.
///
/// The associated functions are stateless. An instance additionally owns
/// the process-wide [`SignalBridge`] for callback registration.
#[cfg_attr(unix, derive(Clone))]
pub struct ProcessControl {
    #[cfg(unix)]
    bridge: SignalBridge,
}

impl ProcessControl {
    /// Detach from the controlling terminal.
    ///
    /// Call before starting the tokio runtime. `nochdir = true` keeps the
    /// working directory; `noclose = true` keeps the standard streams.
    pub fn daemon(noclose: bool, nochdir: bool) -> ProcessResult<()> {
        Self::daemon_with(&DaemonOptions {
            noclose,
            nochdir,
            pid_file: None,
        })
    }

    /// Detach with full options, including a PID file.
    pub fn daemon_with(options: &DaemonOptions) -> ProcessResult<()> {
        daemon::daemonize(options)
    }

    /// Best-effort rename of the process as seen by `ps`.
    pub fn set_title(name: &str) -> bool {
        title::set_title(name)
    }

    /// Current process title, where the platform can report it.
    pub fn title() -> Option<String> {
        title::title()
    }

    /// Send `signal` to `pid`. Signal 0 probes for existence.
    pub fn kill(pid: i32, signal: i32) -> ProcessResult<()> {
        let result = sys::kill(pid, signal);
        match &result {
            Ok(()) => tracing::debug!(pid, signal, "Signal sent"),
            Err(e) => tracing::debug!(pid, signal, error = %e, "Signal not sent"),
        }
        result
    }

    /// Send SIGTERM to `pid`.
    #[cfg(unix)]
    pub fn terminate(pid: i32) -> ProcessResult<()> {
        Self::kill(pid, libc::SIGTERM)
    }

    /// Whether `pid` exists. A process owned by another user still counts.
    ///
    /// Zero and negative values name process groups, not a process, and
    /// always report false.
    pub fn is_alive(pid: i32) -> bool {
        if pid <= 0 {
            return false;
        }
        match sys::kill(pid, 0) {
            Ok(()) => true,
            Err(ProcessError::Os { source, .. }) => source.kind() == ErrorKind::PermissionDenied,
            Err(_) => false,
        }
    }

    /// PID of the calling process.
    pub fn get_pid() -> u32 {
        std::process::id()
    }
}

#[cfg(unix)]
impl ProcessControl {
    /// Wrap an installed bridge.
    pub fn new(bridge: SignalBridge) -> Self {
        Self { bridge }
    }

    /// Bind `signals` to `callback`, or clear them when it is `None`.
    ///
    /// With `enable_coroutine` the callback runs as a new task on the
    /// bridge's runtime; otherwise it runs on the dispatcher thread and its
    /// failures go to the bridge's error reporter.
    pub fn register_signal_handlers(
        &self,
        signals: &[i32],
        callback: Option<SignalHandler>,
        enable_coroutine: bool,
    ) -> ProcessResult<()> {
        self.bridge
            .set(signals, callback, Dispatch::from(enable_coroutine))
    }

    /// The underlying bridge.
    pub fn bridge(&self) -> &SignalBridge {
        &self.bridge
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_get_pid_matches_os() {
        let pid = ProcessControl::get_pid();
        assert!(pid > 0);
        assert_eq!(pid as i32, nix::unistd::getpid().as_raw());
    }

    #[test]
    fn test_probe_self_and_missing() {
        let pid = ProcessControl::get_pid() as i32;
        assert!(ProcessControl::kill(pid, 0).is_ok());
        assert!(ProcessControl::is_alive(pid));

        // pid_max never reaches i32::MAX, so this pid cannot exist.
        let err = ProcessControl::kill(i32::MAX, 0).unwrap_err();
        assert_eq!(err.raw_os_error(), Some(libc::ESRCH));
        assert!(!ProcessControl::is_alive(i32::MAX));
    }

    #[test]
    fn test_group_targets_are_not_alive() {
        assert!(!ProcessControl::is_alive(0));
        assert!(!ProcessControl::is_alive(-1));
        assert!(!ProcessControl::is_alive(-(ProcessControl::get_pid() as i32)));
    }
}
