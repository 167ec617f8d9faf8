//! Platform capability probe.
//!
//! # Responsibilities
//! - Classify the build target into the three families process control cares about
//! - Answer per-operation capability questions (title, fork under a scheduler)
//!
//! # Design Decisions
//! - Decided at compile time from `cfg!`; no OS string sniffing at runtime
//! - Every platform-conditional operation consults `Platform::current()`

use serde::Serialize;
use std::fmt;

/// Operating system family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Linux, the BSDs and other Unix-likes without Darwin's fork restrictions.
    Posix,
    /// Darwin-based systems (macOS, iOS).
    MacOs,
    /// Windows.
    Windows,
}

impl Platform {
    /// The family this binary was built for.
    pub const fn current() -> Self {
        if cfg!(target_vendor = "apple") {
            Platform::MacOs
        } else if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }

    /// Whether the process title can be changed at all on this family.
    ///
    /// A `true` here still depends on the runtime capability (see
    /// [`crate::process::title`]).
    pub const fn supports_title(self) -> bool {
        matches!(self, Platform::Posix)
    }

    /// Whether forking is safe while a task scheduler is running.
    pub const fn allows_fork_with_scheduler(self) -> bool {
        matches!(self, Platform::Posix)
    }

    /// Whether the platform has POSIX signals and `fork` at all.
    pub const fn is_unix(self) -> bool {
        !matches!(self, Platform::Windows)
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::Posix => "posix",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        };
        f.write_str(name)
    }
}
