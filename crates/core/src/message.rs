// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message types shared by the store and the synchronization engine.
//!
//! A [`Message`] is immutable once recorded. Its [`MessageId`] is assigned by
//! the store and increases monotonically, which is what lets a single integer
//! marker describe how far synchronization has progressed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// Store-assigned message identifier.
///
/// Zero is reserved: it is never assigned to a stored message and doubles as
/// the "never synchronized" marker value.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MessageId(i64);

impl MessageId {
    /// The marker value used before anything has been synchronized.
    pub const ZERO: MessageId = MessageId(0);

    pub const fn new(id: i64) -> Self {
        MessageId(id)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    /// Returns true if this id could have been assigned by the store.
    pub fn is_assigned(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for MessageId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let value: i64 = s
            .trim()
            .parse()
            .map_err(|_| Error::InvalidMarker(s.to_string()))?;
        if value < 0 {
            return Err(Error::InvalidMarker(s.to_string()));
        }
        Ok(MessageId(value))
    }
}

impl From<i64> for MessageId {
    fn from(id: i64) -> Self {
        MessageId(id)
    }
}

/// Direction of a message relative to this installation.
///
/// Only [`MessageKind::Received`] messages are synchronized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// Captured from the network.
    Received,
    /// Sent (or queued to be sent) by the host.
    Outbound,
}

impl MessageKind {
    /// Returns the string representation used in storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageKind::Received => "received",
            MessageKind::Outbound => "outbound",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MessageKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "received" => Ok(MessageKind::Received),
            "outbound" => Ok(MessageKind::Outbound),
            _ => Err(Error::InvalidKind(s.to_string())),
        }
    }
}

/// A recorded message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub sender: String,
    pub recipient: String,
    pub body: String,
    pub recorded_at: DateTime<Utc>,
}

impl Message {
    /// Creates a received message with the given id.
    pub fn received(
        id: MessageId,
        sender: impl Into<String>,
        body: impl Into<String>,
        recorded_at: DateTime<Utc>,
    ) -> Self {
        Message {
            id,
            kind: MessageKind::Received,
            sender: sender.into(),
            recipient: String::new(),
            body: body.into(),
            recorded_at,
        }
    }

    pub fn is_received(&self) -> bool {
        self.kind == MessageKind::Received
    }

    /// Checks that the message is fit to be queued for delivery.
    ///
    /// A message without a store-assigned id cannot move the marker and is
    /// rejected.
    pub fn validate(&self) -> Result<()> {
        if !self.id.is_assigned() {
            return Err(Error::InvalidMessage(format!(
                "message has no store-assigned id (got {})",
                self.id
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
