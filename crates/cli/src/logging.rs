// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::fs;
use std::path::Path;

use tracing_subscriber::EnvFilter;

use crate::env::vars;

/// Log file name inside the state directory.
pub const LOG_FILE: &str = "msync.log";

/// Install the global subscriber, filtered by `RUST_LOG` (default `info`).
///
/// Logs go to `log_path` when it can be opened, otherwise to stderr. A second
/// call is a no-op.
pub fn setup_logging(log_path: &Path) {
    let filter = EnvFilter::try_from_env(vars::RUST_LOG).unwrap_or_else(|_| EnvFilter::new("info"));

    // Try to open log file, fall back to stderr
    if let Ok(file) = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)
    {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(file)
            .with_ansi(false)
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}
