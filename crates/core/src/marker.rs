// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Persistence of the synchronization marker.
//!
//! The marker is the id of the highest message known to have been delivered.
//! It only ever moves forward: [`MarkerStore::advance`] ignores values that
//! do not exceed the stored one.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::error::{Error, Result};
use crate::message::MessageId;

/// Read/write access to the persisted marker.
pub trait MarkerStore: Send + Sync {
    /// Returns the current marker, [`MessageId::ZERO`] if never synchronized.
    fn get(&self) -> Result<MessageId>;

    /// Moves the marker to `id` if it exceeds the current value.
    ///
    /// Returns true if the stored value changed. The new value is durable
    /// when this returns.
    fn advance(&self, id: MessageId) -> Result<bool>;
}

/// Marker stored as a decimal integer in a single file.
///
/// Writes go to a sibling temp file which is fsynced and renamed into place,
/// so a crash mid-write leaves the previous value intact. The directory is
/// fsynced after the rename so the new entry survives a power loss.
pub struct FileMarkerStore {
    path: PathBuf,
    bootstrap: MessageId,
    /// Serializes read-compare-write cycles within this process.
    lock: Mutex<()>,
}

impl FileMarkerStore {
    /// Filename used inside the state directory.
    pub const FILE_NAME: &'static str = "last_synced_id";

    /// Opens the marker file at `path`.
    ///
    /// `bootstrap` is reported while the file does not exist yet.
    pub fn open(path: &Path, bootstrap: MessageId) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }
        Ok(FileMarkerStore {
            path: path.to_path_buf(),
            bootstrap,
            lock: Mutex::new(()),
        })
    }

    /// Opens `<state_dir>/last_synced_id`.
    pub fn in_dir(state_dir: &Path, bootstrap: MessageId) -> Result<Self> {
        Self::open(&state_dir.join(Self::FILE_NAME), bootstrap)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> Result<MessageId> {
        match fs::read_to_string(&self.path) {
            Ok(content) => content.parse().map_err(|_| {
                Error::CorruptedData(format!(
                    "marker file {} holds '{}'",
                    self.path.display(),
                    content.trim()
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(self.bootstrap),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, id: MessageId) -> Result<()> {
        let tmp = self.path.with_extension("tmp");
        {
            let mut file = File::create(&tmp)?;
            write!(file, "{}", id)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        sync_parent(&self.path)?;
        Ok(())
    }
}

impl MarkerStore for FileMarkerStore {
    fn get(&self) -> Result<MessageId> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        self.read()
    }

    fn advance(&self, id: MessageId) -> Result<bool> {
        let _guard = self.lock.lock().map_err(|_| poisoned())?;
        // The bootstrap value counts as current, so a missing file still
        // refuses to move backwards.
        if id <= self.read()? {
            return Ok(false);
        }
        self.write(id)?;
        Ok(true)
    }
}

/// Marker kept in memory only. Used by tests and hosts that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryMarkerStore {
    value: Mutex<MessageId>,
}

impl MemoryMarkerStore {
    pub fn new(initial: MessageId) -> Self {
        MemoryMarkerStore {
            value: Mutex::new(initial),
        }
    }
}

impl MarkerStore for MemoryMarkerStore {
    fn get(&self) -> Result<MessageId> {
        Ok(*self.value.lock().map_err(|_| poisoned())?)
    }

    fn advance(&self, id: MessageId) -> Result<bool> {
        let mut value = self.value.lock().map_err(|_| poisoned())?;
        if id > *value {
            *value = id;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

/// Flush the directory entry of `path` to disk.
#[cfg(unix)]
fn sync_parent(path: &Path) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    File::open(dir)?.sync_all()?;
    Ok(())
}

// Directory handles cannot be fsynced here; the rename is the last step.
#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> Result<()> {
    Ok(())
}

fn poisoned() -> Error {
    Error::CorruptedData("marker lock poisoned".to_string())
}

#[cfg(test)]
#[path = "marker_tests.rs"]
mod tests;
