// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;
use common::*;

#[test]
fn fails_without_url() {
    let temp = TempDir::new().unwrap();

    msync(&temp)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("synchronization URL is not set"));

    assert!(temp.path().join("msync.log").exists());
}

#[test]
fn rejects_unsupported_scheme() {
    let temp = TempDir::new().unwrap();
    write_config(&temp, "[sync]\nurl = \"ftp://collector.example\"\n");

    msync(&temp)
        .arg("run")
        .assert()
        .failure()
        .stderr(predicate::str::contains("scheme must be http or https"));
}

#[test]
fn missing_explicit_config_fails() {
    let temp = TempDir::new().unwrap();

    msync(&temp)
        .args(["run", "--config"])
        .arg(temp.path().join("absent.toml"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read config"));
}
