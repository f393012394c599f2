// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

use crate::sync::TransportError;

/// All possible errors that can occur in the msync library.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("config error: {0}")]
    Config(String),

    #[error("lifecycle error: {0}")]
    Lifecycle(String),

    #[error("no async runtime available\n  hint: the synchronizer must be created inside a tokio runtime")]
    NoRuntime,

    #[error("delivery failed: {0}")]
    Transport(#[from] TransportError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config file: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Core(msync_core::Error),
}

/// A specialized Result type for msync operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<msync_core::Error> for Error {
    fn from(e: msync_core::Error) -> Self {
        match e {
            msync_core::Error::InvalidMessage(s) => Error::InvalidMessage(s),
            msync_core::Error::Io(e) => Error::Io(e),
            other => Error::Core(other),
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
