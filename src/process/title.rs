//! Process title.
//!
//! Best effort only: on Linux the calling thread is renamed via
//! `prctl(PR_SET_NAME)`, which is the process name `ps` shows when called
//! from the main thread. The kernel keeps at most 15 bytes.

use std::ffi::CString;

use crate::platform::Platform;
use crate::sys;

/// Rename the process. Returns false where that is not possible; never fails.
pub fn set_title(name: &str) -> bool {
    set_title_on(Platform::current(), name)
}

pub(crate) fn set_title_on(platform: Platform, name: &str) -> bool {
    if !platform.supports_title() {
        tracing::debug!(%platform, "Process title not supported on this platform");
        return false;
    }
    let Ok(name) = CString::new(name) else {
        tracing::debug!("Process title contains a NUL byte");
        return false;
    };
    sys::set_name(&name)
}

/// Current process title, where it can be read back.
pub fn title() -> Option<String> {
    if !Platform::current().supports_title() {
        return None;
    }
    sys::get_name()
}
