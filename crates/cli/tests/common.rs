// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

// Allow unused items: test helpers are shared across multiple test binaries,
// and not every test file uses every helper.
#![allow(dead_code)]
#![allow(unused_imports)]

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;

pub use predicates::prelude::*;
pub use tempfile::TempDir;

/// `msync` pointed at `temp` as its state directory.
pub fn msync(temp: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("msync");
    cmd.arg("--state-dir")
        .arg(temp.path())
        .env_remove("MSYNC_STATE_DIR")
        .env_remove("RUST_LOG");
    cmd
}

/// Write `<state_dir>/config.toml`.
pub fn write_config(temp: &TempDir, content: &str) {
    std::fs::write(temp.path().join("config.toml"), content).unwrap();
}

/// Record a received message and return the printed id.
pub fn record(temp: &TempDir, from: &str, body: &str) -> String {
    let output = msync(temp)
        .args(["record", "--from", from, body])
        .output()
        .unwrap();
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout)
        .split_whitespace()
        .last()
        .unwrap()
        .to_string()
}
