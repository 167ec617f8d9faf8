//! Process control utilities: daemonize, process title, kill, PID and
//! asynchronous signal handlers dispatched onto tokio tasks.

pub mod config;
pub mod lifecycle;
pub mod observability;
pub mod platform;
pub mod process;
pub mod signals;

mod sys;

pub use config::schema::ProcessConfig;
pub use lifecycle::Shutdown;
pub use platform::Platform;
pub use process::{ProcessControl, ProcessError, ProcessResult};
#[cfg(unix)]
pub use signals::SignalBridge;
