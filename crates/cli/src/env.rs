// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access.
//!
//! The variable name constants are generated by `build.rs` and live in the
//! [`vars`] submodule.

use std::path::PathBuf;

/// Generated environment variable name constants.
pub mod vars {
    include!(concat!(env!("OUT_DIR"), "/env_vars.rs"));
}

/// Returns the value of `MSYNC_STATE_DIR` if set.
pub fn state_dir() -> Option<PathBuf> {
    std::env::var(vars::MSYNC_STATE_DIR).ok().map(PathBuf::from)
}

/// Returns the value of `XDG_STATE_HOME` if set.
pub fn xdg_state_home() -> Option<PathBuf> {
    std::env::var(vars::XDG_STATE_HOME).ok().map(PathBuf::from)
}

/// Resolve the state directory.
///
/// An explicit path wins, then `MSYNC_STATE_DIR`, then
/// `$XDG_STATE_HOME/msync`, then `~/.local/state/msync`.
pub fn resolve_state_dir(explicit: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = explicit {
        return dir;
    }
    if let Some(dir) = state_dir() {
        return dir;
    }
    if let Some(dir) = xdg_state_home() {
        return dir.join("msync");
    }
    dirs::home_dir()
        .map(|h| h.join(".local/state/msync"))
        .unwrap_or_else(|| PathBuf::from(".local/state/msync"))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
