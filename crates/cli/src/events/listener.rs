// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Notification listener: forwards received-message saves to a target.

use std::sync::Arc;

use msync_core::{HostEvent, Message};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::sync::{QueueProcessor, Transport};

/// Anything that accepts messages for delivery.
pub trait MessageTarget: Send + Sync {
    /// Hand over one message. Must not block.
    fn accept(&self, message: Message);
}

impl<T: Transport + 'static> MessageTarget for QueueProcessor<T> {
    fn accept(&self, message: Message) {
        if let Err(e) = self.queue(message) {
            warn!("dropping notified message: {}", e);
        }
    }
}

/// Forward `event` to `target` if it is a save of a received message.
///
/// Returns true if the event was forwarded.
pub fn forward_event(event: &HostEvent, target: &dyn MessageTarget) -> bool {
    match event.received_message() {
        Some(message) => {
            target.accept(message.clone());
            true
        }
        None => false,
    }
}

/// A registered listener. Dropping the handle leaves the task running until
/// the bus closes; call [`ListenerHandle::unregister`] to stop it.
pub struct ListenerHandle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl ListenerHandle {
    /// Stop listening and wait for the task to exit.
    pub async fn unregister(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("listener task ended abnormally: {}", e);
        }
    }

    #[cfg(test)]
    pub(crate) fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// Spawn a task forwarding events from `rx` to `target`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_listener(
    mut rx: broadcast::Receiver<HostEvent>,
    target: Arc<dyn MessageTarget>,
) -> ListenerHandle {
    let cancel = CancellationToken::new();
    let token = cancel.clone();

    let handle = tokio::spawn(async move {
        loop {
            let event = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                event = rx.recv() => event,
            };
            match event {
                Ok(event) => {
                    if !forward_event(&event, target.as_ref()) {
                        debug!(?event, "ignoring event");
                    }
                }
                Err(RecvError::Lagged(missed)) => {
                    // Anything missed is still above the marker and comes
                    // back with the next backlog scan.
                    warn!(missed, "event listener lagged");
                }
                Err(RecvError::Closed) => {
                    debug!("event bus closed");
                    break;
                }
            }
        }
    });

    ListenerHandle { cancel, handle }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
