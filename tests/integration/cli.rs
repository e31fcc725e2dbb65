//! Binary smoke tests.

use assert_cmd::Command;
use predicates::prelude::*;

use super::common::package_fixtures::PackageWorkspace;

#[test]
fn test_help_lists_commands() {
    Command::cargo_bin("packserve")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("bump"));
}

#[test]
fn test_serve_without_packages_fails() {
    let ws = PackageWorkspace::new();
    let config = ws.root.join("empty.toml");
    std::fs::write(&config, "").unwrap();

    Command::cargo_bin("packserve")
        .unwrap()
        .args(["serve", "--config"])
        .arg(&config)
        .arg(ws.root.join("missing"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("no usable package directories"));
}

#[test]
fn test_bump_rejects_bad_nonce() {
    let ws = PackageWorkspace::new();

    Command::cargo_bin("packserve")
        .unwrap()
        .args(["bump", "--nonce", "../x", "--manifest"])
        .arg(ws.root.join("package.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid nonce"));
}
