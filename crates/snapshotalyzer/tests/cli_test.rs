#![allow(deprecated)] // TODO: migrate Command::cargo_bin to cargo_bin_cmd!

use assert_cmd::Command;
use predicates::prelude::*;

fn shotty() -> Command {
    let mut cmd = Command::cargo_bin("shotty").unwrap();
    // keep the user's environment out of the tests
    cmd.env_remove("SHOTTY_PROFILE")
        .env_remove("SHOTTY_CONFIG_PATH")
        .env("SHOTTY_LOG", "off");
    cmd
}

/// CLI help lists the command groups
#[test]
fn test_cli_help() {
    shotty()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshots"))
        .stdout(predicate::str::contains("volumes"))
        .stdout(predicate::str::contains("instances"))
        .stdout(predicate::str::contains("--profile"));
}

#[test]
fn test_cli_version() {
    shotty()
        .arg("version")
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshotalyzer"));
}

#[test]
fn test_instances_help() {
    shotty()
        .args(["instances", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("snapshot"))
        .stdout(predicate::str::contains("start"))
        .stdout(predicate::str::contains("stop"))
        .stdout(predicate::str::contains("reboot"));
}

#[test]
fn test_snapshot_help() {
    shotty()
        .args(["instances", "snapshot", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--project"))
        .stdout(predicate::str::contains("--instance"))
        .stdout(predicate::str::contains("--force"));
}

#[test]
fn test_snapshots_list_help() {
    shotty()
        .args(["snapshots", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--all"));
}

/// Unscoped mutations are refused before any AWS access
#[test]
fn test_snapshot_without_target_is_refused() {
    shotty()
        .args(["instances", "snapshot"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"))
        .stderr(predicate::str::contains("--force"));
}

#[test]
fn test_stop_without_target_is_refused() {
    shotty()
        .args(["instances", "stop", "--wait"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--project"));
}

#[test]
fn test_blank_project_counts_as_absent() {
    shotty()
        .args(["instances", "reboot", "--project", ""])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Error:"));
}

/// A broken config file is reported instead of silently ignored
#[test]
fn test_malformed_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("config.yaml");
    std::fs::write(&config_path, "wait: [not, a, map]\n").unwrap();

    shotty()
        .arg("--config")
        .arg(&config_path)
        .args(["instances", "list"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("failed to parse"));
}

#[test]
fn test_missing_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();

    shotty()
        .env("SHOTTY_CONFIG_PATH", temp_dir.path().join("missing.yaml"))
        .args(["volumes", "list"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));
}

#[test]
fn test_invalid_command() {
    shotty().arg("invalid-command").assert().failure();
}
