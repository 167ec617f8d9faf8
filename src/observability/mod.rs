//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → tracing events with structured fields (signal, pid, error)
//!
//! Consumers:
//!     → logging.rs fmt layer (stderr; /dev/null once daemonized)
//! ```
//!
//! # Design Decisions
//! - Library code only emits events; the binary installs the subscriber
//! - Bridge delivery counters live on the bridge (`SignalBridge::stats`)

pub mod logging;

pub use logging::{LogHandle, LoggingError};
