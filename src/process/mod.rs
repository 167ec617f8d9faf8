//! Process control subsystem.
//!
//! # Operations
//! ```text
//! ProcessControl::daemon(noclose, nochdir)  → daemon.rs (platform-gated fork)
//! ProcessControl::set_title(name)           → title.rs (best effort, bool)
//! ProcessControl::kill(pid, signal)         → sys (kill(2))
//! ProcessControl::get_pid()                 → std::process::id
//! control.register_signal_handlers(..)      → signals::SignalBridge
//! ```
//!
//! # Design Decisions
//! - Platform-unsupported conditions are `Unsupported` errors or `false`,
//!   never panics
//! - Syscall failures carry the errno in `ProcessError::Os`

pub mod control;
pub mod daemon;
pub mod title;
pub mod types;

pub use control::ProcessControl;
pub use daemon::DaemonOptions;
pub use types::{BoxError, ProcessError, ProcessResult};
