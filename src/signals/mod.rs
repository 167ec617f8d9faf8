//! Signal dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! register(signals, callback, dispatch)
//!     → bridge.rs (validate, update handler table, sigaction)
//!
//! signal delivered
//!     → sys handler writes signal number to self-pipe
//!     → dispatch.rs thread reads it
//!     → Inline: callback runs on the dispatcher thread, failures → reporter.rs
//!     → Task:   callback submitted to the tokio runtime as a new task
//! ```
//!
//! # Design Decisions
//! - User code never runs inside the OS signal handler itself
//! - The error reporter is injected at construction, never looked up globally
//! - Dispositions are process-wide state with explicit install/shutdown

#[cfg(unix)]
pub mod bridge;
#[cfg(unix)]
pub mod dispatch;
pub mod reporter;
pub mod types;

#[cfg(unix)]
pub use bridge::{SignalBridge, SignalBridgeBuilder};
#[cfg(unix)]
pub use dispatch::StatsSnapshot;
pub use reporter::{ErrorReporter, TracingReporter};
pub use types::{handler, CallbackError, CallbackErrorKind, Dispatch, SignalHandler};

pub use crate::sys::{parse_signal, signal_name};
