//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → ProcessConfig (validated, immutable)
//!
//! On reload signal:
//!     lifecycle reloads the file through loader.rs
//!     → validation.rs validates
//!     → new log level applied, rest of config kept
//! ```
//!
//! # Design Decisions
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Signal names are resolved once, at validation time

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::ProcessConfig;
pub use schema::DaemonConfig;
pub use schema::SignalConfig;
pub use validation::ValidationError;
