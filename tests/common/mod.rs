//! Shared utilities for signal integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use procctl::signals::{handler, Dispatch, SignalBridge, SignalHandler};

/// Upper bound for anything that should happen "promptly".
pub const WAIT: Duration = Duration::from_secs(5);

/// Send `signal` to the calling thread.
///
/// The handler runs before this returns, so bytes reach the bridge's pipe in
/// call order. A process-directed `kill` may be taken by any thread.
pub fn raise(signal: i32) {
    let signal = Signal::try_from(signal).expect("valid signal");
    nix::sys::signal::raise(signal).expect("raise");
}

/// A handler that forwards every delivered signal to a channel and counts calls.
pub fn recorder() -> (SignalHandler, Receiver<i32>, Arc<AtomicUsize>) {
    let (tx, rx) = mpsc::channel();
    let tx = Mutex::new(tx);
    let count = Arc::new(AtomicUsize::new(0));
    let calls = count.clone();

    let h = handler(move |signal| {
        calls.fetch_add(1, Ordering::SeqCst);
        let _ = tx.lock().unwrap().send(signal);
        Ok(())
    });
    (h, rx, count)
}

/// Wait until every delivery sent before this call has been dispatched.
///
/// Registers an inline marker on `signal`, raises it and waits for it. The
/// dispatcher handles pipe bytes in order, so anything raised earlier is done.
pub fn barrier(bridge: &SignalBridge, signal: i32) {
    let (h, rx, _) = recorder();
    bridge.register(&[signal], h, Dispatch::Inline).unwrap();
    raise(signal);
    assert_eq!(rx.recv_timeout(WAIT).expect("barrier signal"), signal);
}

/// Ordered event log shared between callbacks and the test body.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<&'static str>>>);

impl EventLog {
    pub fn push(&self, event: &'static str) {
        self.0.lock().unwrap().push(event);
    }

    pub fn events(&self) -> Vec<&'static str> {
        self.0.lock().unwrap().clone()
    }

    /// Poll until `event` shows up.
    pub fn wait_for(&self, event: &'static str) {
        let deadline = Instant::now() + WAIT;
        while !self.events().contains(&event) {
            assert!(Instant::now() < deadline, "timed out waiting for {event}");
            std::thread::sleep(Duration::from_millis(5));
        }
    }
}

/// Poll `condition` until it holds or the wait expires.
pub fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + WAIT;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Current handler address for `signal` (`SIG_DFL`, `SIG_IGN` or a function).
pub fn disposition(signal: i32) -> libc::sighandler_t {
    // SAFETY: a null new action only queries the current one.
    unsafe {
        let mut current: libc::sigaction = std::mem::zeroed();
        assert_eq!(libc::sigaction(signal, std::ptr::null(), &mut current), 0);
        current.sa_sigaction
    }
}
