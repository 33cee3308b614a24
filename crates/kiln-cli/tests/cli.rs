//! End-to-end tests for the `kiln` binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn kiln() -> Command {
    let mut cmd = Command::cargo_bin("kiln").unwrap();
    for key in ["KILN_PORT", "KILN_OUTDIR", "KILN_WATCH", "KILN_AUTOROUTE", "KILN_ENTRY", "KILN_SRC"] {
        cmd.env_remove(key);
    }
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn test_help_lists_modes() {
    kiln()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--watch"))
        .stdout(predicate::str::contains("--serve"));
}

#[test]
fn test_version() {
    kiln()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_build_without_entry_fails() {
    let temp = TempDir::new().unwrap();

    kiln()
        .arg("--cwd")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Entry point not found"));
}

#[test]
fn test_invalid_config_fails() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("kiln.config.json"), r#"{ "port": "not a port" }"#).unwrap();

    kiln()
        .arg("--cwd")
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Configuration error"));
}

#[test]
fn test_explicit_config_must_exist() {
    let temp = TempDir::new().unwrap();

    kiln()
        .arg("--cwd")
        .arg(temp.path())
        .args(["--config", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config file not found"));
}

#[test]
fn test_port_zero_rejected() {
    kiln().args(["--serve", "--port", "0"]).assert().failure();
}

#[test]
fn test_watch_and_serve_conflict() {
    kiln().args(["--watch", "--serve"]).assert().failure();
}

#[test]
fn test_missing_project_dir_fails() {
    let temp = TempDir::new().unwrap();

    kiln()
        .arg("--cwd")
        .arg(temp.path().join("nope"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("File not found"));
}
