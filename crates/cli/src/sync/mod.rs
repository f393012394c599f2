// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Message synchronization engine.
//!
//! Delivers recorded messages to a remote collection endpoint over HTTP,
//! once each and in the order they were queued.
//!
//! # Architecture
//!
//! ```text
//!  backlog scan ─┐
//!                ├──► ┌─────────────┐     ┌──────────────────┐     ┌───────────┐
//!  live events ──┘    │  WorkQueue  │────►│  QueueProcessor  │────►│ Transport │──► remote
//!                     └─────────────┘     │  (one worker)    │     └───────────┘
//!                                         └──────────────────┘
//!                                            │           │
//!                                            ▼           ▼
//!                                      MarkerStore   OutcomeSink
//! ```
//!
//! # Features
//!
//! - FIFO work queue safe for concurrent producers
//! - Single background worker with cooperative start/stop
//! - Marker advanced only after confirmed delivery, never backwards
//! - Optional bounded retry with exponential backoff
//! - Injectable transport trait for testing

mod outcome;
mod processor;
mod queue;
mod transport;

pub use outcome::{ChannelSink, DeliveryOutcome, OutcomeSink, SinkSlot, TracingSink};
pub use processor::{ProcessorState, ProcessorStats, QueueProcessor};
pub use queue::WorkQueue;
pub use transport::{render_template, Endpoint, HttpTransport, Transport, TransportError, TransportResult};

#[cfg(test)]
pub(crate) mod test_helpers;



#[cfg(test)]
mod processor_tests;
