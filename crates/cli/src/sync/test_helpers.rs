// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for sync module tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Mutex;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use msync_core::{Message, MessageId};

use super::outcome::{DeliveryOutcome, OutcomeSink};
use crate::config::SyncConfig;

/// Create a received test message with the given id.
pub fn make_message(id: i64) -> Message {
    Message::received(
        MessageId::new(id),
        format!("sender-{}", id),
        format!("body {}", id),
        Utc.timestamp_opt(1_700_000_000 + id, 0).unwrap(),
    )
}

/// Create messages for each id, in the given order.
pub fn make_messages(ids: &[i64]) -> Vec<Message> {
    ids.iter().copied().map(make_message).collect()
}

/// Config pointing at a local URL with fast retry settings.
pub fn test_config() -> SyncConfig {
    let mut config = SyncConfig::new("http://127.0.0.1:9/sync");
    config.retry.initial_delay_ms = 1;
    config.retry.max_delay_secs = 1;
    config
}

/// Outcome sink that keeps every outcome in memory.
#[derive(Default)]
pub struct RecordingSink {
    outcomes: Mutex<Vec<DeliveryOutcome>>,
}

impl RecordingSink {
    pub fn outcomes(&self) -> Vec<DeliveryOutcome> {
        self.outcomes.lock().unwrap().clone()
    }

    pub fn len(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }
}

impl OutcomeSink for RecordingSink {
    fn report(&self, outcome: &DeliveryOutcome) {
        self.outcomes.lock().unwrap().push(outcome.clone());
    }
}

/// Poll `cond` until it holds, failing the test after five seconds.
pub async fn wait_until<F: Fn() -> bool>(cond: F) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !cond() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("condition not reached within 5s");
}
