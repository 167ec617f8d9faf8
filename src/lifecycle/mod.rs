//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (runner.rs):
//!     Load config → Validate → Daemonize → Title → Runtime → Signal bridge
//!
//! Signals (runner.rs):
//!     shutdown signals (SIGTERM/SIGINT) → Shutdown::trigger
//!     reload signals (SIGHUP) → reload config, apply log level
//!
//! Shutdown (shutdown.rs):
//!     Signal received → subscribers wake → bridge restores dispositions → Exit
//! ```
//!
//! # Design Decisions
//! - Daemonize before the runtime exists (fork safety)
//! - Shutdown carries the triggering signal number

#[cfg(unix)]
pub mod runner;
pub mod shutdown;

#[cfg(unix)]
pub use runner::{RunError, Runner};
pub use shutdown::Shutdown;
