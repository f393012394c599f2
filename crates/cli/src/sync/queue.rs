// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory work queue of messages awaiting delivery.
//!
//! Producers (backlog replay, live notifications) append from any thread
//! without blocking beyond a short lock. The single consumer waits
//! asynchronously for the next entry. Entries leave the queue only by being
//! dequeued or by an explicit [`WorkQueue::clear`]. Duplicates are kept:
//! the two producers can race on the same message and the marker comparison
//! downstream makes a second delivery harmless.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard, PoisonError};

use msync_core::{Message, MessageId};
use tokio::sync::Notify;

use crate::error::{Error, Result};

#[derive(Default)]
struct QueueState {
    entries: VecDeque<Message>,
    closed: bool,
}

/// FIFO queue of pending deliveries.
#[derive(Default)]
pub struct WorkQueue {
    state: Mutex<QueueState>,
    /// Signalled on every append and on close.
    available: Notify,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append one message.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessage`] if the message has no store-assigned
    /// id, or [`Error::Lifecycle`] once the queue has been closed.
    pub fn enqueue(&self, message: Message) -> Result<()> {
        message.validate()?;
        {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::Lifecycle("work queue is shut down".to_string()));
            }
            state.entries.push_back(message);
        }
        self.available.notify_one();
        Ok(())
    }

    /// Append a batch in iteration order.
    ///
    /// The batch becomes visible to the consumer at once; no concurrent
    /// enqueue lands between its entries. Invalid messages are logged and
    /// skipped. Returns the number of entries appended.
    pub fn enqueue_all<I>(&self, messages: I) -> Result<usize>
    where
        I: IntoIterator<Item = Message>,
    {
        let batch: Vec<Message> = messages
            .into_iter()
            .filter(|m| match m.validate() {
                Ok(()) => true,
                Err(e) => {
                    tracing::warn!("dropping message from batch: {}", e);
                    false
                }
            })
            .collect();
        if batch.is_empty() {
            return Ok(0);
        }

        let count = batch.len();
        {
            let mut state = self.lock();
            if state.closed {
                return Err(Error::Lifecycle("work queue is shut down".to_string()));
            }
            state.entries.extend(batch);
        }
        self.available.notify_one();
        Ok(count)
    }

    /// Remove the oldest entry without waiting.
    #[cfg(test)]
    pub(crate) fn try_dequeue(&self) -> Option<Message> {
        self.lock().entries.pop_front()
    }

    /// Wait for the oldest entry.
    ///
    /// Returns `None` once the queue is closed. Dropping the returned future
    /// before it resolves never loses an entry.
    pub async fn wait_and_dequeue(&self) -> Option<Message> {
        loop {
            // Created before checking so a notification between the check
            // and the await is not missed.
            let notified = self.available.notified();
            {
                let mut state = self.lock();
                if state.closed {
                    return None;
                }
                if let Some(message) = state.entries.pop_front() {
                    return Some(message);
                }
            }
            notified.await;
        }
    }

    /// Number of pending entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Lowest id among pending entries.
    pub fn min_id(&self) -> Option<MessageId> {
        self.lock().entries.iter().map(|m| m.id).min()
    }

    /// Drop every pending entry, returning how many were removed.
    pub fn clear(&self) -> usize {
        let mut state = self.lock();
        let removed = state.entries.len();
        state.entries.clear();
        removed
    }

    /// Shut the queue down, waking any waiting consumer.
    ///
    /// Pending entries stay in place but are no longer handed out.
    pub fn close(&self) {
        self.lock().closed = true;
        self.available.notify_waiters();
        self.available.notify_one();
    }

    #[cfg(test)]
    pub(crate) fn is_closed(&self) -> bool {
        self.lock().closed
    }
}
