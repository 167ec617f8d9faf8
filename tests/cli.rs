//! The `procctl` binary end to end.

#![cfg(unix)]

use std::fs;
use std::os::unix::process::ExitStatusExt;
use std::path::Path;
use std::process::Command;

use procctl::ProcessControl;

mod common;
use common::eventually;

const BIN: &str = env!("CARGO_BIN_EXE_procctl");

fn read_pid(path: &Path) -> Option<i32> {
    fs::read_to_string(path).ok()?.trim().parse().ok()
}

fn write_config(dir: &Path, pid_file: &Path, daemon: &str) -> std::path::PathBuf {
    let path = dir.join("procctl.toml");
    fs::write(
        &path,
        format!(
            "[daemon]\npid_file = \"{}\"\n{daemon}\n[process]\ntitle = \"procctl-e2e\"\n",
            pid_file.display()
        ),
    )
    .unwrap();
    path
}

#[test]
fn test_pid_command() {
    let output = Command::new(BIN).arg("pid").output().unwrap();
    assert!(output.status.success());
    let pid: u32 = String::from_utf8(output.stdout).unwrap().trim().parse().unwrap();
    assert!(pid > 0);
}

#[test]
fn test_probe_command() {
    let own = ProcessControl::get_pid().to_string();
    let output = Command::new(BIN).args(["probe", &own]).output().unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "alive");

    let output = Command::new(BIN).args(["probe", "0"]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "absent");

    let missing = i32::MAX.to_string();
    let output = Command::new(BIN).args(["probe", &missing]).output().unwrap();
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "absent");
}

#[test]
fn test_info_command() {
    let output = Command::new(BIN).arg("info").output().unwrap();
    assert!(output.status.success());

    let info: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(info["pid"].as_u64().unwrap() > 0);
    assert!(info["platform"].is_string());
    assert!(info["title_supported"].is_boolean());
}

#[test]
fn test_kill_command() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id().to_string();

    let status = Command::new(BIN)
        .args(["kill", &pid, "-s", "INT"])
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(child.wait().unwrap().signal(), Some(libc::SIGINT));
}

#[test]
fn test_logs_stay_off_stdout() {
    let mut child = Command::new("sleep").arg("30").spawn().unwrap();
    let pid = child.id().to_string();

    let output = Command::new(BIN)
        .env_remove("RUST_LOG")
        .args(["--log-level", "debug", "kill", &pid, "-s", "TERM"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Signal sent"));

    child.wait().unwrap();
}

#[test]
fn test_kill_command_unknown_signal() {
    let output = Command::new(BIN)
        .args(["kill", "1", "-s", "SIGNOPE"])
        .output()
        .unwrap();
    assert!(!output.status.success());
}

#[test]
fn test_run_foreground_until_sigint() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("fg.pid");
    let config = write_config(dir.path(), &pid_file, "");

    let mut child = Command::new(BIN)
        .args(["run", "-c"])
        .arg(&config)
        .spawn()
        .unwrap();

    assert!(eventually(|| read_pid(&pid_file).is_some()));
    assert_eq!(read_pid(&pid_file), Some(child.id() as i32));

    ProcessControl::kill(child.id() as i32, libc::SIGINT).unwrap();
    let status = child.wait().unwrap();
    assert!(status.success());
    assert!(!pid_file.exists());
}

#[test]
fn test_run_daemonized_until_sigterm() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("daemon.pid");
    let config = write_config(dir.path(), &pid_file, "");

    // The foreground parent exits as soon as the daemon has forked.
    let status = Command::new(BIN)
        .args(["run", "--daemon", "-c"])
        .arg(&config)
        .status()
        .unwrap();
    assert!(status.success());

    assert!(eventually(|| read_pid(&pid_file).is_some()));
    let pid = read_pid(&pid_file).unwrap();
    assert!(ProcessControl::is_alive(pid));

    ProcessControl::terminate(pid).unwrap();
    assert!(eventually(|| !pid_file.exists()));
}

#[cfg(target_os = "linux")]
#[test]
fn test_daemon_detaches_cwd_and_streams() {
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("detached.pid");
    let config = write_config(dir.path(), &pid_file, "nochdir = false\nnoclose = false\n");

    let status = Command::new(BIN)
        .current_dir(dir.path())
        .args(["run", "-c"])
        .arg(&config)
        .arg("--daemon")
        .status()
        .unwrap();
    assert!(status.success());

    assert!(eventually(|| read_pid(&pid_file).is_some()));
    let pid = read_pid(&pid_file).unwrap();

    let proc_dir = Path::new("/proc").join(pid.to_string());
    assert_eq!(fs::read_link(proc_dir.join("cwd")).unwrap(), Path::new("/"));
    for fd in ["0", "1", "2"] {
        let target = fs::read_link(proc_dir.join("fd").join(fd)).unwrap();
        assert_eq!(target, Path::new("/dev/null"), "fd {fd}");
    }

    ProcessControl::terminate(pid).unwrap();
    assert!(eventually(|| !pid_file.exists()));
}
