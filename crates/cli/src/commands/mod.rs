// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod record;
pub mod run;
pub mod status;

use std::path::PathBuf;

use msync_core::{FileMarkerStore, MessageId, SqliteMessageStore};

use crate::config::Config;
use crate::env;
use crate::error::Result;

/// Paths shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub state_dir: PathBuf,
    pub config_path: PathBuf,
    /// Whether the config path was given on the command line.
    config_explicit: bool,
}

impl Context {
    pub fn new(state_dir: Option<PathBuf>, config: Option<PathBuf>) -> Self {
        let state_dir = env::resolve_state_dir(state_dir);
        let config_explicit = config.is_some();
        let config_path = config.unwrap_or_else(|| Config::path_in(&state_dir));
        Context {
            state_dir,
            config_path,
            config_explicit,
        }
    }

    /// Load the config. A missing default config yields defaults; a missing
    /// explicit one is an error.
    pub fn load_config(&self) -> Result<Config> {
        if self.config_explicit {
            return Config::load(&self.config_path);
        }
        Ok(Config::load_optional(&self.config_path)?.unwrap_or_default())
    }

    pub fn open_store(&self) -> Result<SqliteMessageStore> {
        let path = self.state_dir.join(SqliteMessageStore::FILE_NAME);
        Ok(SqliteMessageStore::open(&path)?)
    }

    pub fn marker_store(&self, bootstrap: MessageId) -> Result<FileMarkerStore> {
        Ok(FileMarkerStore::in_dir(&self.state_dir, bootstrap)?)
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
