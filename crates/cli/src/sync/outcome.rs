// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Delivery outcome reporting.
//!
//! Every delivery attempt for a queue entry ends in exactly one
//! [`DeliveryOutcome`], handed to an [`OutcomeSink`]. Sinks are called from
//! the worker task and must return promptly.

use std::sync::{Arc, PoisonError, RwLock};

use msync_core::MessageId;
use tokio::sync::mpsc;

/// Result of delivering one queue entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryOutcome {
    pub message_id: MessageId,
    /// `METHOD url` of the endpoint.
    pub endpoint: String,
    pub success: bool,
    /// Attempts made, including retries.
    pub attempts: u32,
    /// Last failure reason, if any.
    pub reason: Option<String>,
}

impl DeliveryOutcome {
    /// One-line rendering for display, e.g. `POST https://host/api...Succeeded!`.
    pub fn log_line(&self) -> String {
        if self.success {
            format!("{}...Succeeded!", self.endpoint)
        } else {
            format!("{}...Failed!", self.endpoint)
        }
    }
}

/// Receives delivery outcomes.
pub trait OutcomeSink: Send + Sync {
    fn report(&self, outcome: &DeliveryOutcome);
}

/// Sink that writes outcomes to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn report(&self, outcome: &DeliveryOutcome) {
        if outcome.success {
            tracing::info!(message_id = %outcome.message_id, "{}", outcome.log_line());
        } else {
            tracing::warn!(
                message_id = %outcome.message_id,
                reason = outcome.reason.as_deref().unwrap_or("unknown"),
                "{}",
                outcome.log_line()
            );
        }
    }
}

/// Sink that forwards outcomes into an unbounded channel.
///
/// Never blocks. Outcomes sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<DeliveryOutcome>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<DeliveryOutcome>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ChannelSink { tx }, rx)
    }
}

impl OutcomeSink for ChannelSink {
    fn report(&self, outcome: &DeliveryOutcome) {
        let _ = self.tx.send(outcome.clone());
    }
}

/// Replaceable sink reference.
///
/// Outcomes reported while empty are dropped, so the engine can run before
/// any display is attached.
#[derive(Default)]
pub struct SinkSlot {
    sink: RwLock<Option<Arc<dyn OutcomeSink>>>,
}

impl SinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, sink: Arc<dyn OutcomeSink>) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = Some(sink);
    }

    pub fn clear(&self) {
        *self.sink.write().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

impl OutcomeSink for SinkSlot {
    fn report(&self, outcome: &DeliveryOutcome) {
        // Clone out so a slow sink does not hold the lock.
        let sink = self
            .sink
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(sink) = sink {
            sink.report(outcome);
        }
    }
}
