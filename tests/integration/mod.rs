//! Integration tests for the changelogd binary.
//!
//! These tests exercise the full CLI against scratch project directories.

use assert_cmd::Command;
use assert_fs::prelude::*;
use assert_fs::TempDir;
use predicates::prelude::*;

/// Get a command for running changelogd in `dir`.
fn changelogd(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("changelogd").unwrap();
    cmd.current_dir(dir.path())
        .env_remove("CHANGELOGD_CONFIG")
        .env_remove("RUST_LOG")
        .arg("--no-interactive");
    cmd
}

fn initialized() -> TempDir {
    let temp = TempDir::new().unwrap();
    changelogd(&temp).arg("init").assert().success();
    temp
}

#[test]
fn version_flag_works() {
    Command::cargo_bin("changelogd")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("changelogd"));
}

#[test]
fn help_lists_commands() {
    Command::cargo_bin("changelogd")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("entry"))
        .stdout(predicate::str::contains("release"))
        .stdout(predicate::str::contains("partial"));
}

#[test]
fn init_scaffolds_directory() {
    let temp = initialized();

    temp.child("changelog.d/config.yaml")
        .assert(predicate::path::is_file());
    temp.child("changelog.d/templates/main.md")
        .assert(predicate::path::is_file());
    temp.child("changelog.d/releases")
        .assert(predicate::path::is_dir());
}

#[test]
fn init_refuses_existing_directory_without_force() {
    let temp = initialized();

    changelogd(&temp)
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));

    changelogd(&temp).args(["init", "--force"]).assert().success();
}

#[test]
fn entry_then_release() {
    let temp = initialized();

    changelogd(&temp)
        .args([
            "entry",
            "--type",
            "feature",
            "--field",
            "message=Ship it",
            "--no-git-add",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Created entry"));

    changelogd(&temp)
        .args(["draft", "--version", "1.0.0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("## 1.0.0"))
        .stdout(predicate::str::contains("* Ship it"));

    changelogd(&temp)
        .args(["release", "1.0.0"])
        .assert()
        .success();

    temp.child("changelog.d/releases/0.1.0.0.yaml")
        .assert(predicate::path::is_file());
    temp.child("changelog.md")
        .assert(predicate::str::contains("* Ship it"));
}

#[test]
fn release_without_entries_fails() {
    let temp = initialized();

    changelogd(&temp)
        .args(["release", "1.0.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--empty"));

    temp.child("changelog.md").assert(predicate::path::missing());
}

#[test]
fn entry_without_type_fails_non_interactively() {
    let temp = initialized();

    changelogd(&temp)
        .args(["entry", "--field", "message=x"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("--type"));
}

#[test]
fn missing_configuration_fails() {
    let temp = TempDir::new().unwrap();

    changelogd(&temp)
        .arg("partial")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("changelogd init"));
}

#[test]
fn config_env_selects_directory() {
    let temp = TempDir::new().unwrap();
    changelogd(&temp)
        .args(["init", "--path", "docs/changes"])
        .assert()
        .success();

    changelogd(&temp)
        .env("CHANGELOGD_CONFIG", temp.path().join("docs/changes"))
        .arg("partial")
        .assert()
        .success();

    temp.child("docs/changelog.md")
        .assert(predicate::str::starts_with("# Changelog"));
}

#[test]
fn completion_generates_script() {
    Command::cargo_bin("changelogd")
        .unwrap()
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("changelogd"));
}
