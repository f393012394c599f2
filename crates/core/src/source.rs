// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Read-only view of the message store used by the synchronizer.

use crate::error::Result;
use crate::message::{Message, MessageId};

/// Read access to recorded messages.
pub trait MessageSource: Send + Sync {
    /// Returns every received message with an id above `marker`, ascending.
    fn fetch_after(&self, marker: MessageId) -> Result<Vec<Message>>;

    /// Returns the message with the given id.
    ///
    /// Fails with [`Error::MessageNotFound`](crate::Error::MessageNotFound)
    /// if there is none.
    fn fetch_by_id(&self, id: MessageId) -> Result<Message>;
}
