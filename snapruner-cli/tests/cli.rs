#![cfg(unix)]
//! Binary-level contract: exit codes, override flags, log file output.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Harness
// ---------------------------------------------------------------------------

/// Write a stub snapraid that logs its invocations and plays `cases`
/// (sh `case` arms keyed by subcommand). Returns (executable, call log).
fn stub_snapraid(dir: &Path, cases: &str) -> (PathBuf, PathBuf) {
    let call_log = dir.join("calls.log");
    let executable = dir.join("snapraid");
    let script = format!(
        "#!/bin/sh\necho \"$@\" >> \"{log}\"\ncase \"$1\" in\n{cases}\n*) exit 0 ;;\nesac\n",
        log = call_log.display()
    );
    fs::write(&executable, script).expect("write stub");
    fs::set_permissions(&executable, fs::Permissions::from_mode(0o755)).expect("chmod stub");
    (executable, call_log)
}

/// Minimal config pointing at the stub, with extra sections appended.
fn write_config(dir: &Path, executable: &Path, extra: &str) -> PathBuf {
    let tool_config = dir.join("snapraid.conf");
    fs::write(&tool_config, "").expect("write tool config");
    let path = dir.join("snapruner.yml");
    let contents = format!(
        "snapraid:\n  executable: {}\n  config: {}\n  deletethreshold: -1\n{extra}",
        executable.display(),
        tool_config.display()
    );
    fs::write(&path, contents).expect("write config");
    path
}

fn snapruner() -> Command {
    Command::cargo_bin("snapruner").expect("binary built")
}

// ---------------------------------------------------------------------------
// Setup failures (exit 2)
// ---------------------------------------------------------------------------

#[test]
fn missing_config_file_exits_2() {
    snapruner()
        .arg("--conf")
        .arg("/nonexistent/snapruner.yml")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("configuration file not found"));
}

#[test]
fn malformed_config_exits_2() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("snapruner.yml");
    fs::write(&path, "snapraid: [unclosed\n").expect("write config");

    snapruner()
        .arg("--conf")
        .arg(&path)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("failed to load configuration"));
}

// ---------------------------------------------------------------------------
// Run outcomes
// ---------------------------------------------------------------------------

#[test]
fn clean_run_exits_0() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, call_log) =
        stub_snapraid(dir.path(), "diff) echo \"add a\"; exit 2 ;;");
    let config = write_config(dir.path(), &executable, "");

    snapruner()
        .arg("--conf")
        .arg(&config)
        .assert()
        .success()
        .stdout(predicate::str::contains("Running sync..."))
        .stdout(predicate::str::contains("Run finished successfully"));

    let calls = fs::read_to_string(&call_log).expect("read call log");
    assert!(calls.lines().any(|line| line.starts_with("sync")));
}

#[test]
fn no_changes_logs_noop_and_exits_0() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, call_log) = stub_snapraid(dir.path(), "diff) exit 0 ;;");
    let config = write_config(dir.path(), &executable, "");

    snapruner()
        .arg("--conf")
        .arg(&config)
        .assert()
        .success()
        .stdout(
            predicate::str::contains("No changes detected, no sync required").count(1),
        );

    let calls = fs::read_to_string(&call_log).expect("read call log");
    assert!(!calls.lines().any(|line| line.starts_with("sync")));
}

#[test]
fn threshold_abort_exits_1_with_remediation_hint() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, call_log) = stub_snapraid(
        dir.path(),
        "diff) printf 'remove a\\nremove b\\n'; exit 2 ;;",
    );
    let config = write_config(
        dir.path(),
        &executable,
        "", // threshold set below via its own config
    );
    // Tighten the gate to one removal.
    let contents = fs::read_to_string(&config)
        .expect("read config")
        .replace("deletethreshold: -1", "deletethreshold: 1");
    fs::write(&config, contents).expect("rewrite config");

    snapruner()
        .arg("--conf")
        .arg(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("exceed delete threshold"))
        .stdout(predicate::str::contains("--ignore-deletethreshold"))
        .stdout(predicate::str::contains("Run failed"));

    let calls = fs::read_to_string(&call_log).expect("read call log");
    assert!(!calls.lines().any(|line| line.starts_with("sync")));
}

#[test]
fn ignore_deletethreshold_flag_lets_the_sync_proceed() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, call_log) = stub_snapraid(
        dir.path(),
        "diff) printf 'remove a\\nremove b\\n'; exit 2 ;;",
    );
    let config = write_config(dir.path(), &executable, "");
    let contents = fs::read_to_string(&config)
        .expect("read config")
        .replace("deletethreshold: -1", "deletethreshold: 1");
    fs::write(&config, contents).expect("rewrite config");

    snapruner()
        .arg("--conf")
        .arg(&config)
        .arg("--ignore-deletethreshold")
        .assert()
        .success();

    let calls = fs::read_to_string(&call_log).expect("read call log");
    assert!(calls.lines().any(|line| line.starts_with("sync")));
}

#[test]
fn no_scrub_flag_disables_configured_scrub() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, call_log) = stub_snapraid(dir.path(), "diff) exit 0 ;;");
    let config = write_config(
        dir.path(),
        &executable,
        "scrub:\n  enabled: true\n  plan: new\n",
    );

    snapruner()
        .arg("--conf")
        .arg(&config)
        .arg("--no-scrub")
        .assert()
        .success();

    let calls = fs::read_to_string(&call_log).expect("read call log");
    assert!(!calls.lines().any(|line| line.starts_with("scrub")));
}

#[test]
fn command_failure_exits_1() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, _call_log) = stub_snapraid(
        dir.path(),
        "diff) echo \"add a\"; exit 2 ;;\nsync) exit 1 ;;",
    );
    let config = write_config(dir.path(), &executable, "");

    snapruner()
        .arg("--conf")
        .arg(&config)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed with exit code 1"))
        .stdout(predicate::str::contains("Run failed"));
}

// ---------------------------------------------------------------------------
// Log file
// ---------------------------------------------------------------------------

#[test]
fn log_file_receives_run_and_tool_output() {
    let dir = TempDir::new().expect("tempdir");
    let (executable, _call_log) =
        stub_snapraid(dir.path(), "diff) echo \"add a\"; exit 2 ;;");
    let log_path = dir.path().join("run.log");
    let config = write_config(
        dir.path(),
        &executable,
        &format!("logging:\n  file: {}\n  maxsize: 0\n", log_path.display()),
    );

    snapruner().arg("--conf").arg(&config).assert().success();

    let log = fs::read_to_string(&log_path).expect("read log file");
    assert!(log.contains("Run started"));
    assert!(log.contains("add a"), "tool output teed into the log file");
    assert!(log.contains("Run finished successfully"));
}
