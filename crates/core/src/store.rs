// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! SQLite-backed message store.
//!
//! The host records messages here; the synchronizer reads them back through
//! the [`MessageSource`] contract.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use crate::error::{Error, Result};
use crate::message::{Message, MessageId, MessageKind};
use crate::source::MessageSource;

/// SQL schema for the message store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT NOT NULL,
    sender TEXT NOT NULL,
    recipient TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL,
    recorded_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_messages_kind ON messages(kind, id);
"#;

const SELECT_COLUMNS: &str = "SELECT id, kind, sender, recipient, body, recorded_at FROM messages";

/// Parse a string value from the database, returning a rusqlite error on parse failure.
fn parse_db<T: std::str::FromStr>(
    value: &str,
    column: &str,
) -> std::result::Result<T, rusqlite::Error> {
    value.parse().map_err(|_| {
        rusqlite::Error::FromSqlConversionFailure(
            0,
            rusqlite::types::Type::Text,
            Box::new(Error::CorruptedData(format!(
                "invalid value '{value}' in column '{column}'"
            ))),
        )
    })
}

/// Parse an RFC3339 timestamp from the database.
fn parse_timestamp(
    value: &str,
    column: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(Error::CorruptedData(format!(
                    "invalid timestamp '{value}' in column '{column}'"
                ))),
            )
        })
}

fn row_to_message(row: &Row<'_>) -> std::result::Result<Message, rusqlite::Error> {
    let kind_str: String = row.get(1)?;
    let recorded_str: String = row.get(5)?;
    Ok(Message {
        id: MessageId::new(row.get(0)?),
        kind: parse_db::<MessageKind>(&kind_str, "kind")?,
        sender: row.get(2)?,
        recipient: row.get(3)?,
        body: row.get(4)?,
        recorded_at: parse_timestamp(&recorded_str, "recorded_at")?,
    })
}

/// Message store backed by a single SQLite database.
///
/// The connection sits behind a mutex so the store can be shared between the
/// host's writers and the synchronizer's readers.
pub struct SqliteMessageStore {
    conn: Mutex<Connection>,
}

impl SqliteMessageStore {
    /// Filename used inside the state directory.
    pub const FILE_NAME: &'static str = "messages.db";

    /// Open or create the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteMessageStore {
            conn: Mutex::new(conn),
        })
    }

    /// Open an in-memory store (for testing).
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteMessageStore {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::CorruptedData("message store lock poisoned".to_string()))
    }

    /// Record a new message and return it with its assigned id.
    pub fn record(
        &self,
        kind: MessageKind,
        sender: &str,
        recipient: &str,
        body: &str,
        recorded_at: DateTime<Utc>,
    ) -> Result<Message> {
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO messages (kind, sender, recipient, body, recorded_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                kind.as_str(),
                sender,
                recipient,
                body,
                recorded_at.to_rfc3339()
            ],
        )?;
        Ok(Message {
            id: MessageId::new(conn.last_insert_rowid()),
            kind,
            sender: sender.to_string(),
            recipient: recipient.to_string(),
            body: body.to_string(),
            recorded_at,
        })
    }

    /// Returns every message, of any kind, with an id above `after`.
    ///
    /// Used by watchers that publish save notifications for new rows.
    pub fn fetch_all_after(&self, after: MessageId) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!("{SELECT_COLUMNS} WHERE id > ?1 ORDER BY id"))?;
        let messages = stmt
            .query_map(params![after.get()], row_to_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    /// Highest id currently stored, [`MessageId::ZERO`] when empty.
    pub fn max_id(&self) -> Result<MessageId> {
        let conn = self.conn()?;
        let max: Option<i64> =
            conn.query_row("SELECT MAX(id) FROM messages", [], |row| row.get(0))?;
        Ok(MessageId::new(max.unwrap_or(0)))
    }

    /// Number of received messages above `marker`.
    pub fn count_after(&self, marker: MessageId) -> Result<usize> {
        let conn = self.conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM messages WHERE kind = ?1 AND id > ?2",
            params![MessageKind::Received.as_str(), marker.get()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or(0))
    }
}

impl MessageSource for SqliteMessageStore {
    fn fetch_after(&self, marker: MessageId) -> Result<Vec<Message>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "{SELECT_COLUMNS} WHERE kind = ?1 AND id > ?2 ORDER BY id"
        ))?;
        let messages = stmt
            .query_map(
                params![MessageKind::Received.as_str(), marker.get()],
                row_to_message,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(messages)
    }

    fn fetch_by_id(&self, id: MessageId) -> Result<Message> {
        let conn = self.conn()?;
        conn.query_row(
            &format!("{SELECT_COLUMNS} WHERE id = ?1"),
            params![id.get()],
            row_to_message,
        )
        .optional()?
        .ok_or(Error::MessageNotFound(id))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
