// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Polls the message store and publishes a save event for every new row.
//!
//! The standalone binary has no host application to publish events, so this
//! watcher produces them from the database instead.

use std::sync::Arc;
use std::time::Duration;

use msync_core::{HostEvent, MessageId, SqliteMessageStore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::bus::EventBus;
use crate::error::Result;

pub struct StoreWatcher {
    store: Arc<SqliteMessageStore>,
    bus: EventBus,
    interval: Duration,
}

impl StoreWatcher {
    pub fn new(store: Arc<SqliteMessageStore>, bus: EventBus, interval: Duration) -> Self {
        StoreWatcher {
            store,
            bus,
            interval,
        }
    }

    /// Publish every row above `*last` and move `*last` to the newest id.
    ///
    /// Returns the number of events published.
    pub fn poll_once(&self, last: &mut MessageId) -> Result<usize> {
        let messages = self.store.fetch_all_after(*last)?;
        let count = messages.len();
        for message in messages {
            *last = std::cmp::max(*last, message.id);
            self.bus.publish(HostEvent::MessageSaved(message));
        }
        if count > 0 {
            debug!(count, last = %last, "published new messages");
        }
        Ok(count)
    }

    /// Poll on an interval until `cancel` fires, starting above `after`.
    pub fn spawn(self, after: MessageId, cancel: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut last = after;
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                if let Err(e) = self.poll_once(&mut last) {
                    warn!("failed to poll message store: {}", e);
                }
            }
        })
    }
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
