// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for msync-core operations.

use thiserror::Error;

use crate::message::MessageId;

/// All possible errors that can occur in msync-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("message not found: {0}")]
    MessageNotFound(MessageId),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid message kind: '{0}'\n  hint: valid kinds are: received, outbound")]
    InvalidKind(String),

    #[error("invalid marker: '{0}'\n  hint: the marker is a non-negative message id")]
    InvalidMarker(String),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("corrupted data: {0}")]
    CorruptedData(String),
}

/// A specialized Result type for msync-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
