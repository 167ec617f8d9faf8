//! POSIX implementation on top of `nix`.

use std::ffi::CStr;
use std::fs::OpenOptions;
use std::os::unix::io::{AsRawFd, RawFd};
use std::str::FromStr;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};

use nix::errno::Errno;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{self, ForkResult, Pid};

use crate::process::types::{ProcessError, ProcessResult};

/// Write end of the bridge's self-pipe, or -1 when no bridge is listening.
static WAKE_FD: AtomicI32 = AtomicI32::new(-1);

/// Handlers currently between loading `WAKE_FD` and finishing their write.
static IN_FLIGHT: AtomicUsize = AtomicUsize::new(0);

extern "C" fn on_signal(signum: libc::c_int) {
    IN_FLIGHT.fetch_add(1, Ordering::SeqCst);
    let fd = WAKE_FD.load(Ordering::SeqCst);
    if fd >= 0 {
        let saved = Errno::last_raw();
        let byte = signum as u8;
        // SAFETY: write(2) is async-signal-safe and `byte` lives across the call.
        // A full pipe drops the byte; the pending deliveries already queued cover it.
        unsafe {
            libc::write(fd, std::ptr::addr_of!(byte).cast(), 1);
        }
        Errno::set_raw(saved);
    }
    IN_FLIGHT.fetch_sub(1, Ordering::SeqCst);
}

/// Point the signal handler at a new wake descriptor.
pub fn set_wake_fd(fd: RawFd) {
    WAKE_FD.store(fd, Ordering::SeqCst);
}

/// Detach the signal handler from any wake descriptor.
///
/// Returns once no handler can still write to the old descriptor, so the
/// caller may close it.
pub fn clear_wake_fd() {
    WAKE_FD.store(-1, Ordering::SeqCst);
    while IN_FLIGHT.load(Ordering::SeqCst) != 0 {
        std::hint::spin_loop();
    }
}

fn to_signal(signum: i32) -> ProcessResult<Signal> {
    Signal::try_from(signum).map_err(|_| ProcessError::InvalidSignal(signum))
}

/// Reject numbers that are not signals, or that can never be caught.
pub fn validate_catchable(signum: i32) -> ProcessResult<()> {
    match to_signal(signum)? {
        Signal::SIGKILL | Signal::SIGSTOP => Err(ProcessError::InvalidSignal(signum)),
        _ => Ok(()),
    }
}

/// Resolve `TERM`, `SIGTERM`, `sigterm` or `15` to a signal number.
pub fn parse_signal(name: &str) -> ProcessResult<i32> {
    let trimmed = name.trim();
    if let Ok(number) = trimmed.parse::<i32>() {
        if number == 0 {
            return Ok(0);
        }
        return to_signal(number).map(|s| s as i32);
    }

    let upper = trimmed.to_ascii_uppercase();
    let full = if upper.starts_with("SIG") {
        upper
    } else {
        format!("SIG{upper}")
    };
    Signal::from_str(&full)
        .map(|s| s as i32)
        .map_err(|_| ProcessError::UnknownSignal(name.to_string()))
}

/// Canonical name of a signal number, e.g. `SIGTERM`.
pub fn signal_name(signum: i32) -> Option<&'static str> {
    Signal::try_from(signum).ok().map(Signal::as_str)
}

/// Route `signum` to the bridge's wake descriptor.
pub fn install_handler(signum: i32) -> ProcessResult<()> {
    let signal = to_signal(signum)?;
    let action = SigAction::new(
        SigHandler::Handler(on_signal),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: `on_signal` only loads an atomic and calls write(2).
    unsafe { signal::sigaction(signal, &action) }
        .map(drop)
        .map_err(|e| ProcessError::os("sigaction", e))
}

/// Put `signum` back to its default disposition.
pub fn restore_default(signum: i32) -> ProcessResult<()> {
    let signal = to_signal(signum)?;
    let action = SigAction::new(SigHandler::SigDfl, SaFlags::empty(), SigSet::empty());
    // SAFETY: installing SIG_DFL runs no user code.
    unsafe { signal::sigaction(signal, &action) }
        .map(drop)
        .map_err(|e| ProcessError::os("sigaction", e))
}

/// Send `signum` to `pid`. Signal 0 only checks that the target exists.
pub fn kill(pid: i32, signum: i32) -> ProcessResult<()> {
    let signal = match signum {
        0 => None,
        n => Some(to_signal(n)?),
    };
    signal::kill(Pid::from_raw(pid), signal).map_err(|e| ProcessError::os("kill", e))
}

/// Fork into the background and start a new session.
///
/// The parent exits immediately. Only the calling thread survives in the
/// child, so this must run before any other threads are started.
pub fn daemonize(noclose: bool, nochdir: bool) -> ProcessResult<()> {
    // SAFETY: the parent only calls _exit; the child continues on this thread alone.
    match unsafe { unistd::fork() }.map_err(|e| ProcessError::os("fork", e))? {
        ForkResult::Parent { .. } => unsafe { libc::_exit(0) },
        ForkResult::Child => {}
    }

    unistd::setsid().map_err(|e| ProcessError::os("setsid", e))?;

    if !nochdir {
        std::env::set_current_dir("/").map_err(|e| ProcessError::os("chdir", e))?;
    }

    if !noclose {
        redirect_std_streams()?;
    }

    Ok(())
}

fn redirect_std_streams() -> ProcessResult<()> {
    let null = OpenOptions::new()
        .read(true)
        .write(true)
        .open("/dev/null")
        .map_err(|e| ProcessError::os("open /dev/null", e))?;

    for fd in [libc::STDIN_FILENO, libc::STDOUT_FILENO, libc::STDERR_FILENO] {
        unistd::dup2(null.as_raw_fd(), fd).map_err(|e| ProcessError::os("dup2", e))?;
    }
    Ok(())
}

/// Rename the calling thread (the process comm on the main thread).
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn set_name(name: &CStr) -> bool {
    nix::sys::prctl::set_name(name).is_ok()
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn set_name(_name: &CStr) -> bool {
    false
}

/// Name of the calling thread as the kernel reports it.
#[cfg(any(target_os = "linux", target_os = "android"))]
pub fn get_name() -> Option<String> {
    nix::sys::prctl::get_name()
        .ok()
        .map(|name| name.to_string_lossy().into_owned())
}

#[cfg(not(any(target_os = "linux", target_os = "android")))]
pub fn get_name() -> Option<String> {
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_signal_forms() {
        assert_eq!(parse_signal("TERM").unwrap(), libc::SIGTERM);
        assert_eq!(parse_signal("SIGTERM").unwrap(), libc::SIGTERM);
        assert_eq!(parse_signal("sighup").unwrap(), libc::SIGHUP);
        assert_eq!(parse_signal(" 2 ").unwrap(), libc::SIGINT);
        assert_eq!(parse_signal("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_signal_rejects_garbage() {
        assert!(matches!(
            parse_signal("SIGNOPE"),
            Err(ProcessError::UnknownSignal(_))
        ));
        assert!(matches!(
            parse_signal("4096"),
            Err(ProcessError::InvalidSignal(4096))
        ));
    }

    #[test]
    fn test_signal_name() {
        assert_eq!(signal_name(libc::SIGUSR1), Some("SIGUSR1"));
        assert_eq!(signal_name(-1), None);
    }

    #[test]
    fn test_uncatchable_signals() {
        assert!(validate_catchable(libc::SIGUSR1).is_ok());
        assert!(validate_catchable(libc::SIGKILL).is_err());
        assert!(validate_catchable(libc::SIGSTOP).is_err());
        assert!(validate_catchable(0).is_err());
    }

    #[test]
    #[serial_test::serial]
    fn test_cleared_wake_fd_receives_nothing() {
        use std::io::Read;
        use std::os::unix::net::UnixStream;

        let (mut reader, writer) = UnixStream::pair().unwrap();
        reader.set_nonblocking(true).unwrap();

        set_wake_fd(writer.as_raw_fd());
        on_signal(libc::SIGUSR1);
        clear_wake_fd();
        on_signal(libc::SIGUSR2);
        assert_eq!(IN_FLIGHT.load(Ordering::SeqCst), 0);

        let mut buf = [0u8; 8];
        let n = reader.read(&mut buf).unwrap();
        assert_eq!(&buf[..n], &[libc::SIGUSR1 as u8]);
    }

    #[test]
    fn test_kill_invalid_signal_number() {
        let err = kill(std::process::id() as i32, 4096).unwrap_err();
        assert!(matches!(err, ProcessError::InvalidSignal(4096)));
    }
}
