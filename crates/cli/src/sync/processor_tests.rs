// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Tests for the queue processor.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::sync::Arc;
use std::time::Duration;

use msync_core::{MarkerStore, MemoryMarkerStore, MessageId};

use super::test_helpers::{make_message, make_messages, test_config, wait_until, RecordingSink};
use super::transport_tests::MockTransport;
use super::*;
use crate::config::{MarkerPolicy, SyncConfig};
use crate::error::Error;

struct Harness {
    processor: QueueProcessor<MockTransport>,
    transport: MockTransport,
    marker: Arc<MemoryMarkerStore>,
    sink: Arc<RecordingSink>,
}

impl Harness {
    fn new(marker: i64) -> Self {
        Self::with_config(marker, test_config())
    }

    fn with_config(marker: i64, config: SyncConfig) -> Self {
        Self::with_transport(marker, config, MockTransport::new())
    }

    fn with_transport(marker: i64, config: SyncConfig, transport: MockTransport) -> Self {
        let marker = Arc::new(MemoryMarkerStore::new(MessageId::new(marker)));
        let sink = Arc::new(RecordingSink::default());
        let processor =
            QueueProcessor::new(config, transport.clone(), marker.clone(), sink.clone()).unwrap();
        Harness {
            processor,
            transport,
            marker,
            sink,
        }
    }

    fn marker(&self) -> i64 {
        self.marker.get().unwrap().get()
    }

    async fn wait_for_outcomes(&self, count: usize) {
        let sink = Arc::clone(&self.sink);
        wait_until(move || sink.len() >= count).await;
    }
}

#[test]
fn test_new_outside_runtime_fails() {
    let marker = Arc::new(MemoryMarkerStore::default());
    let result = QueueProcessor::new(
        test_config(),
        MockTransport::new(),
        marker,
        Arc::new(TracingSink),
    );
    assert!(matches!(result, Err(Error::NoRuntime)));
}

#[tokio::test]
async fn test_new_processor_is_stopped_and_empty() {
    let h = Harness::new(0);
    assert_eq!(h.processor.state(), ProcessorState::Stopped);
    assert_eq!(h.processor.pending(), 0);
    assert_eq!(h.processor.stats(), ProcessorStats::default());
}

#[tokio::test]
async fn test_delivers_in_fifo_order() {
    let h = Harness::new(0);
    h.processor.queue_all(make_messages(&[1, 2, 3])).unwrap();
    h.processor.queue(make_message(4)).unwrap();

    assert!(h.processor.start().await.unwrap());
    h.wait_for_outcomes(4).await;

    assert_eq!(h.transport.delivered(), vec![1, 2, 3, 4]);
    assert_eq!(h.marker(), 4);
    assert!(h.sink.outcomes().iter().all(|o| o.success));
    h.processor.stop().await;
}

#[tokio::test]
async fn test_entries_queued_while_running_are_delivered() {
    let h = Harness::new(0);
    h.processor.start().await.unwrap();

    for id in 1..=5 {
        h.processor.queue(make_message(id)).unwrap();
    }
    h.wait_for_outcomes(5).await;

    assert_eq!(h.transport.delivered(), vec![1, 2, 3, 4, 5]);
    assert_eq!(h.processor.stats().delivered, 5);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_entries_queued_while_stopped_are_retained() {
    let h = Harness::new(0);
    h.processor.queue_all(make_messages(&[1, 2])).unwrap();

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.processor.pending(), 2);
    assert!(h.transport.attempts().is_empty());

    h.processor.start().await.unwrap();
    h.wait_for_outcomes(2).await;
    assert_eq!(h.transport.delivered(), vec![1, 2]);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_stop_then_start_resumes_in_order() {
    let h = Harness::new(0);
    h.processor.start().await.unwrap();
    h.processor.queue(make_message(1)).unwrap();
    h.wait_for_outcomes(1).await;

    assert!(h.processor.stop().await);
    assert_eq!(h.processor.state(), ProcessorState::Stopped);
    h.processor.queue_all(make_messages(&[2, 3])).unwrap();
    assert!(h.processor.start().await.unwrap());
    h.wait_for_outcomes(3).await;

    assert_eq!(h.transport.delivered(), vec![1, 2, 3]);
    assert_eq!(h.marker(), 3);
    h.processor.stop().await;
}

async fn run_gap_scenario(policy: MarkerPolicy) -> Harness {
    let mut config = test_config();
    config.marker_policy = policy;
    let h = Harness::with_config(5, config);
    h.transport.fail_always(7);

    h.processor.queue_all(make_messages(&[6, 7, 8])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(3).await;
    h.processor.stop().await;
    h
}

#[tokio::test]
async fn test_sequential_policy_stops_marker_at_gap() {
    let h = run_gap_scenario(MarkerPolicy::Sequential).await;

    assert_eq!(h.transport.delivered(), vec![6, 8]);
    assert_eq!(h.marker(), 6);
    let outcomes = h.sink.outcomes();
    assert_eq!(
        outcomes.iter().map(|o| o.success).collect::<Vec<_>>(),
        vec![true, false, true]
    );
}

#[tokio::test]
async fn test_highest_policy_advances_past_gap() {
    let h = run_gap_scenario(MarkerPolicy::Highest).await;

    assert_eq!(h.transport.delivered(), vec![6, 8]);
    assert_eq!(h.marker(), 8);
}

#[tokio::test]
async fn test_late_success_closes_gap() {
    let h = Harness::new(5);
    h.transport.fail_times(7, 1);

    h.processor.queue_all(make_messages(&[6, 7, 8])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(3).await;
    assert_eq!(h.marker(), 6);

    // A duplicate entry for 7 succeeds and releases the marker.
    h.processor.queue(make_message(7)).unwrap();
    h.wait_for_outcomes(4).await;
    assert_eq!(h.marker(), 7);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_duplicates_are_delivered_without_moving_marker_back() {
    let mut config = test_config();
    config.marker_policy = MarkerPolicy::Highest;
    let h = Harness::with_config(0, config);
    h.processor.queue_all(make_messages(&[4, 4, 2])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(3).await;

    assert_eq!(h.transport.attempts(), vec![4, 4, 2]);
    assert_eq!(h.marker(), 4);
    assert!(h.processor.is_running());
    h.processor.stop().await;
}

#[tokio::test]
async fn test_sequential_marker_waits_for_lower_pending_entry() {
    let h = Harness::new(5);
    h.transport.fail_always(7);

    // A high id queued ahead of the backlog must not carry the marker past 7.
    h.processor.queue(make_message(9)).unwrap();
    h.processor.queue_all(make_messages(&[6, 7, 8])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(4).await;
    h.processor.stop().await;

    assert_eq!(h.transport.attempts(), vec![9, 6, 7, 8]);
    assert_eq!(h.transport.delivered(), vec![9, 6, 8]);
    assert_eq!(h.marker(), 6);
}

#[tokio::test]
async fn test_sequential_marker_catches_up_once_lower_entries_deliver() {
    let h = Harness::new(0);
    h.processor.queue_all(make_messages(&[3, 1, 2])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(3).await;
    h.processor.stop().await;

    // 3 was held back by pending 1 and 2; the marker ends at the last
    // contiguous success.
    assert_eq!(h.marker(), 2);
}

#[tokio::test]
async fn test_failed_entry_is_not_requeued() {
    let h = Harness::new(0);
    h.transport.fail_always(2);
    h.processor.queue_all(make_messages(&[1, 2, 3])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(3).await;

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(h.transport.attempts(), vec![1, 2, 3]);
    assert_eq!(h.processor.pending(), 0);
    assert_eq!(h.processor.stats().failed, 1);
    assert_eq!(h.processor.stats().delivered, 2);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_one_outcome_per_entry_with_endpoint() {
    let h = Harness::new(0);
    h.transport.fail_always(2);
    h.processor.queue_all(make_messages(&[1, 2])).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(2).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    let outcomes = h.sink.outcomes();
    assert_eq!(outcomes.len(), 2);
    assert_eq!(outcomes[0].endpoint, "POST http://127.0.0.1:9/sync");
    assert_eq!(outcomes[0].log_line(), "POST http://127.0.0.1:9/sync...Succeeded!");
    assert_eq!(outcomes[1].message_id, MessageId::new(2));
    assert_eq!(outcomes[1].reason.as_deref(), Some("connection failed: mock failure"));
    h.processor.stop().await;
}

#[tokio::test]
async fn test_retry_until_success() {
    let mut config = test_config();
    config.retry.max_attempts = 3;
    let h = Harness::with_config(0, config);
    h.transport.fail_times(1, 2);

    h.processor.queue(make_message(1)).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(1).await;

    let outcome = &h.sink.outcomes()[0];
    assert!(outcome.success);
    assert_eq!(outcome.attempts, 3);
    assert_eq!(outcome.reason, None);
    assert_eq!(h.marker(), 1);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_retry_gives_up_after_max_attempts() {
    let mut config = test_config();
    config.retry.max_attempts = 2;
    let h = Harness::with_config(0, config);
    h.transport.fail_always(1);

    h.processor.queue(make_message(1)).unwrap();
    h.processor.start().await.unwrap();
    h.wait_for_outcomes(1).await;

    let outcome = &h.sink.outcomes()[0];
    assert!(!outcome.success);
    assert_eq!(outcome.attempts, 2);
    assert_eq!(h.transport.attempts(), vec![1, 1]);
    assert_eq!(h.marker(), 0);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_stop_abandons_retry_backoff() {
    let mut config = test_config();
    config.retry.max_attempts = 5;
    config.retry.initial_delay_ms = 60_000;
    config.retry.max_delay_secs = 60;
    let h = Harness::with_config(0, config);
    h.transport.fail_always(1);

    h.processor.queue(make_message(1)).unwrap();
    h.processor.start().await.unwrap();
    let transport = h.transport.clone();
    wait_until(move || transport.attempts().len() == 1).await;

    let stopped = tokio::time::timeout(Duration::from_secs(2), h.processor.stop())
        .await
        .unwrap();
    assert!(stopped);

    let outcomes = h.sink.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert!(!outcomes[0].success);
    assert_eq!(outcomes[0].attempts, 1);
    assert_eq!(h.marker(), 0);
}

#[tokio::test]
async fn test_stop_waits_for_in_flight_delivery() {
    let transport = MockTransport::new();
    transport.set_latency(Duration::from_millis(150));
    let h = Harness::with_transport(0, test_config(), transport);

    h.processor.queue_all(make_messages(&[1, 2])).unwrap();
    h.processor.start().await.unwrap();
    let attempts = h.transport.clone();
    wait_until(move || !attempts.attempts().is_empty()).await;

    assert!(h.processor.stop().await);

    // The in-flight request finished and moved the marker; the next did not start.
    assert_eq!(h.transport.delivered(), vec![1]);
    assert_eq!(h.marker(), 1);
    assert_eq!(h.processor.pending(), 1);
    assert_eq!(h.sink.len(), 1);
}

#[tokio::test]
async fn test_double_start_runs_one_worker() {
    let transport = MockTransport::new();
    transport.set_latency(Duration::from_millis(5));
    let h = Harness::with_transport(0, test_config(), transport);

    assert!(h.processor.start().await.unwrap());
    assert!(!h.processor.start().await.unwrap());

    h.processor.queue_all(make_messages(&[1, 2, 3, 4, 5])).unwrap();
    h.wait_for_outcomes(5).await;

    assert_eq!(h.transport.max_in_flight(), 1);
    assert_eq!(h.transport.delivered(), vec![1, 2, 3, 4, 5]);
    h.processor.stop().await;
}

#[tokio::test]
async fn test_concurrent_stops_one_wins() {
    let h = Harness::new(0);
    h.processor.start().await.unwrap();

    let (a, b) = tokio::join!(h.processor.stop(), h.processor.stop());

    assert!(a ^ b, "exactly one stop should win: {a} {b}");
    assert_eq!(h.processor.state(), ProcessorState::Stopped);
}

#[tokio::test]
async fn test_stop_when_stopped_is_noop() {
    let h = Harness::new(0);
    assert!(!h.processor.stop().await);
}

#[tokio::test]
async fn test_start_with_invalid_config_stays_stopped() {
    let h = Harness::with_config(0, SyncConfig::new(""));
    h.processor.queue(make_message(1)).unwrap();

    let err = h.processor.start().await.unwrap_err();

    assert!(matches!(err, Error::Config(_)));
    assert_eq!(h.processor.state(), ProcessorState::Stopped);
    assert_eq!(h.processor.pending(), 1);
}

#[tokio::test]
async fn test_queue_rejects_invalid_message() {
    let h = Harness::new(0);
    let err = h.processor.queue(make_message(0)).unwrap_err();
    assert!(matches!(err, Error::InvalidMessage(_)));
    assert_eq!(h.processor.pending(), 0);
}

#[tokio::test]
async fn test_queue_all_empty_is_noop() {
    let h = Harness::new(5);
    assert_eq!(h.processor.queue_all(Vec::new()).unwrap(), 0);
    assert_eq!(h.processor.pending(), 0);
    assert_eq!(h.marker(), 5);
}

#[tokio::test]
async fn test_clear_drops_pending() {
    let h = Harness::new(0);
    h.processor.queue_all(make_messages(&[1, 2, 3])).unwrap();
    assert_eq!(h.processor.clear(), 3);
    assert_eq!(h.processor.pending(), 0);
}

#[tokio::test]
async fn test_drop_cancels_worker() {
    let h = Harness::new(0);
    h.processor.start().await.unwrap();
    let transport = h.transport.clone();
    drop(h);

    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(transport.attempts().is_empty());
}
