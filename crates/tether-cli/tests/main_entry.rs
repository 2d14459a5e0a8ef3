//! Integration tests for the `tether` binary entry point.
//!
//! Covers the argument surface only; a real run would spawn the server.

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::str::contains;

#[test]
fn help_lists_mode_flag() {
    let mut command = cargo_bin_cmd!("tether");
    command.arg("--help");
    command
        .assert()
        .success()
        .stdout(contains("--mode"))
        .stdout(contains("web"));
}

#[test]
fn version_is_printed() {
    let mut command = cargo_bin_cmd!("tether");
    command.arg("--version");
    command
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn unknown_mode_exits_with_failure() {
    let mut command = cargo_bin_cmd!("tether");
    command.args(["--mode", "bogus"]);
    command
        .assert()
        .failure()
        .stderr(contains("invalid value 'bogus'"));
}

#[test]
fn invalid_port_is_reported() {
    let dir = tempfile::tempdir().expect("temp dir");
    let mut command = cargo_bin_cmd!("tether");
    command
        .current_dir(dir.path())
        .env("PORT", "not-a-port")
        .args(["--mode", "local"]);
    command
        .assert()
        .failure()
        .stderr(contains("PORT must be an integer"));
}
