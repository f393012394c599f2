// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use msync_core::HostEvent;
use tokio::sync::broadcast;

/// Events buffered per subscriber before it starts lagging.
pub const DEFAULT_CAPACITY: usize = 256;

/// Broadcast channel of host events.
///
/// Cloning yields another handle to the same channel.
#[derive(Debug, Clone)]
pub struct EventBus {
    tx: broadcast::Sender<HostEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        EventBus { tx }
    }

    /// Publish an event, returning how many subscribers received it.
    ///
    /// Publishing with no subscribers is not an error; the event is dropped.
    pub fn publish(&self, event: HostEvent) -> usize {
        self.tx.send(event).unwrap_or(0)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HostEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
