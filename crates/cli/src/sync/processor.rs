// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Queue processor: lifecycle control plus the delivery loop.
//!
//! A processor owns a [`WorkQueue`] and at most one background worker. The
//! worker takes entries in FIFO order, delivers each through the
//! [`Transport`], advances the marker on confirmed success and reports one
//! [`DeliveryOutcome`] per entry. Failed entries are not re-queued; the marker
//! stays behind them so the next backlog scan finds them again.
//!
//! `start` and `stop` serialize on a coarse async lock around the worker
//! slot, so concurrent callers always agree on whether a worker exists.
//! Stopping is cooperative: an in-flight request runs to completion, a
//! pending retry backoff is abandoned.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use msync_core::{MarkerStore, Message, MessageId};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::outcome::{DeliveryOutcome, OutcomeSink};
use super::queue::WorkQueue;
use super::transport::{Endpoint, Transport};
use crate::config::{MarkerPolicy, SyncConfig};
use crate::error::{Error, Result};

const STATE_STOPPED: u8 = 0;
const STATE_RUNNING: u8 = 1;

/// Whether a processor currently has a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessorState {
    Stopped,
    Running,
}

impl ProcessorState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorState::Stopped => "stopped",
            ProcessorState::Running => "running",
        }
    }
}

impl fmt::Display for ProcessorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snapshot of a processor's counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProcessorStats {
    /// Entries delivered successfully.
    pub delivered: u64,
    /// Entries given up on.
    pub failed: u64,
    /// Entries waiting in the queue.
    pub pending: usize,
}

/// State shared between the processor handle and its worker.
struct Shared<T> {
    config: SyncConfig,
    endpoint: Endpoint,
    queue: WorkQueue,
    transport: T,
    marker: Arc<dyn MarkerStore>,
    sink: Arc<dyn OutcomeSink>,
    /// Mirrors the worker slot for lock-free reads.
    state: AtomicU8,
    delivered: AtomicU64,
    failed: AtomicU64,
    /// Ids above the marker whose delivery failed and has not succeeded since.
    gaps: Mutex<BTreeSet<MessageId>>,
}

struct RunningWorker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Drains a work queue through a transport with a single background worker.
pub struct QueueProcessor<T: Transport + 'static> {
    shared: Arc<Shared<T>>,
    worker: tokio::sync::Mutex<Option<RunningWorker>>,
    runtime: Handle,
}

impl<T: Transport + 'static> QueueProcessor<T> {
    /// Create a stopped processor with an empty queue.
    ///
    /// The configuration is fixed for the processor's lifetime. It is
    /// validated by [`QueueProcessor::start`], not here, so entries can be
    /// queued before the endpoint is usable.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoRuntime`] when called outside a tokio runtime.
    pub fn new(
        config: SyncConfig,
        transport: T,
        marker: Arc<dyn MarkerStore>,
        sink: Arc<dyn OutcomeSink>,
    ) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let endpoint = Endpoint::from_config(&config);
        Ok(QueueProcessor {
            shared: Arc::new(Shared {
                config,
                endpoint,
                queue: WorkQueue::new(),
                transport,
                marker,
                sink,
                state: AtomicU8::new(STATE_STOPPED),
                delivered: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                gaps: Mutex::new(BTreeSet::new()),
            }),
            worker: tokio::sync::Mutex::new(None),
            runtime,
        })
    }

    pub fn config(&self) -> &SyncConfig {
        &self.shared.config
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.shared.endpoint
    }

    pub fn state(&self) -> ProcessorState {
        match self.shared.state.load(Ordering::Acquire) {
            STATE_RUNNING => ProcessorState::Running,
            _ => ProcessorState::Stopped,
        }
    }

    pub fn is_running(&self) -> bool {
        self.state() == ProcessorState::Running
    }

    /// Number of entries waiting for the worker.
    pub fn pending(&self) -> usize {
        self.shared.queue.len()
    }

    pub fn stats(&self) -> ProcessorStats {
        ProcessorStats {
            delivered: self.shared.delivered.load(Ordering::Relaxed),
            failed: self.shared.failed.load(Ordering::Relaxed),
            pending: self.pending(),
        }
    }

    /// Queue one message. Callable in any state.
    pub fn queue(&self, message: Message) -> Result<()> {
        let id = message.id;
        self.shared.queue.enqueue(message)?;
        debug!(message_id = %id, "queued message");
        Ok(())
    }

    /// Queue messages in order as one batch. Returns how many were queued.
    pub fn queue_all<I>(&self, messages: I) -> Result<usize>
    where
        I: IntoIterator<Item = Message>,
    {
        let count = self.shared.queue.enqueue_all(messages)?;
        if count > 0 {
            debug!(count, "queued batch");
        }
        Ok(count)
    }

    /// Drop every pending entry. Returns how many were removed.
    pub fn clear(&self) -> usize {
        let removed = self.shared.queue.clear();
        if removed > 0 {
            info!(removed, "cleared pending entries");
        }
        removed
    }

    /// Start the worker.
    ///
    /// Returns `Ok(false)` if a worker is already running.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is unusable; the
    /// processor stays stopped.
    pub async fn start(&self) -> Result<bool> {
        let mut slot = self.worker.lock().await;
        if slot.is_some() {
            return Ok(false);
        }
        self.shared.config.validate()?;

        let cancel = CancellationToken::new();
        let handle = self
            .runtime
            .spawn(run_worker(Arc::clone(&self.shared), cancel.clone()));
        *slot = Some(RunningWorker { cancel, handle });
        self.shared.state.store(STATE_RUNNING, Ordering::Release);

        info!(
            endpoint = %self.shared.endpoint.describe(),
            pending = self.pending(),
            "queue processor started"
        );
        Ok(true)
    }

    /// Stop the worker and wait for it to exit.
    ///
    /// Returns `false` if no worker was running. Queued entries are kept.
    pub async fn stop(&self) -> bool {
        let mut slot = self.worker.lock().await;
        let Some(worker) = slot.take() else {
            return false;
        };

        worker.cancel.cancel();
        if let Err(e) = worker.handle.await {
            error!("queue worker ended abnormally: {}", e);
        }
        self.shared.state.store(STATE_STOPPED, Ordering::Release);

        info!(pending = self.pending(), "queue processor stopped");
        true
    }
}

impl<T: Transport + 'static> Drop for QueueProcessor<T> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.get_mut().take() {
            worker.cancel.cancel();
        }
        self.shared.queue.close();
    }
}

async fn run_worker<T: Transport>(shared: Arc<Shared<T>>, cancel: CancellationToken) {
    debug!("queue worker running");
    loop {
        let message = tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            next = shared.queue.wait_and_dequeue() => match next {
                Some(message) => message,
                None => break,
            },
        };
        shared.process(message, &cancel).await;
    }
    debug!("queue worker exited");
}

impl<T: Transport> Shared<T> {
    /// Deliver one entry, retrying per config, and report the outcome.
    async fn process(&self, message: Message, cancel: &CancellationToken) {
        let retry = &self.config.retry;
        let mut attempts = 0u32;
        let mut last_error: Option<String> = None;

        loop {
            attempts += 1;
            debug!(message_id = %message.id, attempt = attempts, "delivering");
            match self.transport.deliver(&self.endpoint, &message).await {
                Ok(()) => {
                    last_error = None;
                    break;
                }
                Err(e) => {
                    warn!(
                        message_id = %message.id,
                        attempt = attempts,
                        "delivery failed: {}",
                        e
                    );
                    last_error = Some(e.to_string());
                }
            }

            if attempts >= retry.max_attempts {
                break;
            }
            let delay = retry.delay_for(attempts);
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    debug!(message_id = %message.id, "retry abandoned by stop");
                    break;
                }
                _ = tokio::time::sleep(delay) => {}
            }
        }

        let success = last_error.is_none();
        if success {
            self.delivered.fetch_add(1, Ordering::Relaxed);
            self.record_success(message.id);
        } else {
            self.failed.fetch_add(1, Ordering::Relaxed);
            self.record_failure(message.id);
        }

        self.sink.report(&DeliveryOutcome {
            message_id: message.id,
            endpoint: self.endpoint.describe(),
            success,
            attempts,
            reason: last_error,
        });
    }

    fn record_success(&self, id: MessageId) {
        let may_advance = {
            let mut gaps = self.gaps.lock().unwrap_or_else(PoisonError::into_inner);
            gaps.remove(&id);
            match self.config.marker_policy {
                MarkerPolicy::Highest => true,
                MarkerPolicy::Sequential => {
                    gaps.first().map_or(true, |gap| id < *gap)
                        && self.queue.min_id().map_or(true, |pending| id <= pending)
                }
            }
        };
        if !may_advance {
            debug!(message_id = %id, "marker held back by earlier failure or pending entry");
            return;
        }

        match self.marker.advance(id) {
            Ok(true) => debug!(marker = %id, "marker advanced"),
            Ok(false) => debug!(message_id = %id, "marker already at or past entry"),
            Err(e) => error!(message_id = %id, "failed to persist marker: {}", e),
        }
    }

    fn record_failure(&self, id: MessageId) {
        // Failures at or below the marker cannot hold it back.
        if let Ok(current) = self.marker.get() {
            if id <= current {
                return;
            }
        }
        self.gaps
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id);
    }
}
