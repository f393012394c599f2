// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Notifications published by the host application.

use serde::{Deserialize, Serialize};

use crate::message::{Message, MessageId};

/// An entity change observed in the host's data store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A message was written to the store.
    MessageSaved(Message),
    /// A message was removed from the store.
    MessageDeleted { id: MessageId },
    /// Any other entity kind, identified by name.
    Other { entity: String },
}

impl HostEvent {
    /// Returns the saved message if this event should be synchronized.
    ///
    /// Only saves of received messages qualify.
    pub fn received_message(&self) -> Option<&Message> {
        match self {
            HostEvent::MessageSaved(m) if m.is_received() => Some(m),
            _ => None,
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
