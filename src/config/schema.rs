//! Configuration schema definitions.
//!
//! This module defines the configuration for `procctl run`.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::process::daemon::DaemonOptions;
use crate::signals::Dispatch;

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ProcessConfig {
    /// Daemonization settings.
    pub daemon: DaemonConfig,

    /// Process identity (title).
    pub process: IdentityConfig,

    /// Signal handling settings.
    pub signals: SignalConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Daemon configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    /// Detach from the terminal before starting.
    pub enabled: bool,

    /// Keep stdin/stdout/stderr open.
    pub noclose: bool,

    /// Keep the current working directory.
    pub nochdir: bool,

    /// Optional PID file, written once signal handlers are installed and
    /// removed on shutdown. Used with or without `enabled`.
    pub pid_file: Option<PathBuf>,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            noclose: false,
            nochdir: true,
            pid_file: None,
        }
    }
}

impl DaemonConfig {
    /// Options for [`crate::process::daemon::daemonize`].
    pub fn options(&self) -> DaemonOptions {
        DaemonOptions {
            noclose: self.noclose,
            nochdir: self.nochdir,
            pid_file: self.pid_file.clone(),
        }
    }
}

/// Process identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct IdentityConfig {
    /// Title shown by `ps`, best effort.
    pub title: Option<String>,
}

/// Signal handling configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SignalConfig {
    /// How callbacks run: `task` or `inline`.
    pub dispatch: Dispatch,

    /// Signals that stop the process gracefully.
    pub shutdown: Vec<String>,

    /// Signals that reload the configuration file.
    pub reload: Vec<String>,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            dispatch: Dispatch::Task,
            shutdown: vec!["SIGTERM".to_string(), "SIGINT".to_string()],
            reload: vec!["SIGHUP".to_string()],
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error, off).
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
