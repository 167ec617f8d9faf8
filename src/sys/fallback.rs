//! Targets without POSIX process control.

use std::ffi::CStr;

use crate::process::types::{ProcessError, ProcessResult};

pub fn validate_catchable(signum: i32) -> ProcessResult<()> {
    Err(ProcessError::InvalidSignal(signum))
}

/// Only numeric forms are understood without a signal table.
pub fn parse_signal(name: &str) -> ProcessResult<i32> {
    name.trim()
        .parse::<i32>()
        .map_err(|_| ProcessError::UnknownSignal(name.to_string()))
}

pub fn signal_name(_signum: i32) -> Option<&'static str> {
    None
}

pub fn kill(_pid: i32, _signum: i32) -> ProcessResult<()> {
    Err(ProcessError::unsupported("kill", "no POSIX signals"))
}

pub fn daemonize(_noclose: bool, _nochdir: bool) -> ProcessResult<()> {
    Err(ProcessError::unsupported("daemon", "no fork"))
}

pub fn set_name(_name: &CStr) -> bool {
    false
}

pub fn get_name() -> Option<String> {
    None
}
