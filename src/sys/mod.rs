//! Raw OS bindings used by process control.
//!
//! Everything here is a thin syscall wrapper; policy (platform gating,
//! logging, the handler table) lives in `process` and `signals`.
//! Targets without POSIX process control get a fallback that refuses every
//! operation with `Unsupported`.

#[cfg(unix)]
mod unix;
#[cfg(unix)]
pub use unix::*;

#[cfg(not(unix))]
mod fallback;
#[cfg(not(unix))]
pub use fallback::*;
