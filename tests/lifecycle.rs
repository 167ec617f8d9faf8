//! Runner lifecycle: signal-driven reload and shutdown in-process.

#![cfg(unix)]

use std::fs;
use std::path::Path;

use libc::{SIGUSR1, SIGUSR2};
use procctl::config::parse_config;
use procctl::lifecycle::Runner;
use procctl::signals::{Dispatch, SignalBridge, TracingReporter};
use serial_test::serial;

mod common;
use common::{eventually, raise};

fn write_config(path: &Path, dispatch: Dispatch, pid_file: &Path) -> procctl::ProcessConfig {
    let text = format!(
        r#"
        [daemon]
        pid_file = "{}"

        [signals]
        dispatch = "{dispatch}"
        shutdown = ["SIGUSR1"]
        reload = ["USR2"]

        [observability]
        log_level = "debug"
        "#,
        pid_file.display()
    );
    fs::write(path, &text).unwrap();
    parse_config(&text).unwrap()
}

async fn run_until_shutdown(dispatch: Dispatch) {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("procctl.toml");
    let pid_file = dir.path().join("procctl.pid");
    let config = write_config(&config_path, dispatch, &pid_file);

    let bridge = SignalBridge::builder()
        .reporter(TracingReporter)
        .install()
        .unwrap();
    let probe = bridge.clone();
    let runner = Runner::new(config, Some(config_path.clone()));
    let serving = tokio::spawn(async move { runner.serve(bridge).await });

    let ready_file = pid_file.clone();
    let ready = tokio::task::spawn_blocking(move || eventually(|| ready_file.exists()))
        .await
        .unwrap();
    assert!(ready, "pid file never appeared");
    assert!(probe.is_registered(SIGUSR1));
    assert!(probe.is_registered(SIGUSR2));

    let contents = fs::read_to_string(&pid_file).unwrap();
    assert_eq!(contents.trim(), std::process::id().to_string());

    // A broken file on reload is reported and the runner keeps going.
    fs::write(&config_path, "[signals\n").unwrap();
    raise(SIGUSR2);
    let failure_probe = probe.clone();
    let failed = tokio::task::spawn_blocking(move || {
        eventually(|| {
            let stats = failure_probe.stats();
            stats.task_failures + stats.inline_failures == 1
        })
    })
    .await
    .unwrap();
    assert!(failed);
    assert!(probe.is_open());

    raise(SIGUSR1);
    let signal = serving.await.unwrap().unwrap();
    assert_eq!(signal, SIGUSR1);

    assert!(!probe.is_open());
    assert!(!pid_file.exists());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_task_dispatch_reload_then_shutdown() {
    run_until_shutdown(Dispatch::Task).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
#[serial]
async fn test_inline_dispatch_reload_then_shutdown() {
    run_until_shutdown(Dispatch::Inline).await;
}
