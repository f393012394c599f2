// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Lifecycle orchestration for the synchronizer.
//!
//! The controller wires the message source, marker store, event bus and a
//! [`QueueProcessor`] together and owns the lifecycle:
//!
//! ```text
//!  Uninitialized ──init──► Initialized ──deinit──► Deinitialized
//!                          (Stopped ⇄ Running)          │
//!                               ▲                       │
//!                               └─────────init──────────┘
//! ```
//!
//! Stopping discards the processor; the next start builds a fresh one and
//! replays the backlog from the persisted marker. Every lifecycle operation
//! takes the same async lock, so they never interleave.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use msync_core::{HostEvent, MarkerStore, Message, MessageId, MessageSource};
use tracing::{debug, info};

use crate::config::SyncConfig;
use crate::error::{Error, Result};
use crate::events::{forward_event, spawn_listener, EventBus, ListenerHandle, MessageTarget};
use crate::sync::{HttpTransport, OutcomeSink, QueueProcessor, SinkSlot, Transport};

/// Builds a fresh transport for each new processor.
pub type TransportFactory<T> = Box<dyn Fn(&SyncConfig) -> Result<T> + Send + Sync>;

/// Externally visible lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    Uninitialized,
    Stopped,
    Running,
    Deinitialized,
}

impl ControllerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerState::Uninitialized => "uninitialized",
            ControllerState::Stopped => "stopped",
            ControllerState::Running => "running",
            ControllerState::Deinitialized => "deinitialized",
        }
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Holds the current processor, if any.
///
/// Shared with the listener task, which queues into whatever processor is
/// present when an event arrives. A freshly installed processor holds live
/// events back until the backlog batch has been queued, so replayed entries
/// always precede anything notified during the scan.
pub struct ProcessorSlot<T: Transport + 'static> {
    current: Mutex<SlotState<T>>,
}

struct SlotState<T: Transport + 'static> {
    processor: Option<Arc<QueueProcessor<T>>>,
    /// Live messages received while the backlog is being replayed.
    held: Option<Vec<Message>>,
}

impl<T: Transport + 'static> ProcessorSlot<T> {
    fn new() -> Self {
        ProcessorSlot {
            current: Mutex::new(SlotState {
                processor: None,
                held: None,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, SlotState<T>> {
        self.current.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self) -> Option<Arc<QueueProcessor<T>>> {
        self.lock().processor.clone()
    }

    /// Install a processor that holds live events until [`Self::release`].
    fn install(&self, processor: Arc<QueueProcessor<T>>) {
        let mut state = self.lock();
        state.processor = Some(processor);
        state.held = Some(Vec::new());
    }

    /// Queue the held events behind whatever is already queued and switch to
    /// direct forwarding. Returns how many held events were queued.
    fn release(&self) -> Result<usize> {
        let mut state = self.lock();
        let held = state.held.take().unwrap_or_default();
        match &state.processor {
            Some(processor) => processor.queue_all(held),
            None => Ok(0),
        }
    }

    fn take(&self) -> Option<Arc<QueueProcessor<T>>> {
        let mut state = self.lock();
        state.held = None;
        state.processor.take()
    }
}

impl<T: Transport + 'static> MessageTarget for ProcessorSlot<T> {
    fn accept(&self, message: Message) {
        let mut state = self.lock();
        let SlotState { processor, held } = &mut *state;
        match (processor, held) {
            (Some(_), Some(held)) => {
                debug!(message_id = %message.id, "holding event until backlog is queued");
                held.push(message);
            }
            (Some(processor), None) => processor.accept(message),
            // Recovered by the backlog scan on the next start.
            (None, _) => debug!(message_id = %message.id, "no processor, dropping event"),
        }
    }
}

enum Phase {
    Uninitialized,
    Initialized { listener: ListenerHandle },
    Deinitialized,
}

/// Orchestrates the synchronizer's components.
pub struct Controller<T: Transport + 'static> {
    config: SyncConfig,
    source: Arc<dyn MessageSource>,
    marker: Arc<dyn MarkerStore>,
    bus: EventBus,
    make_transport: TransportFactory<T>,
    sink: Arc<SinkSlot>,
    slot: Arc<ProcessorSlot<T>>,
    phase: tokio::sync::Mutex<Phase>,
}

impl Controller<HttpTransport> {
    /// Controller delivering over HTTP with the configured timeout.
    pub fn http(
        config: SyncConfig,
        source: Arc<dyn MessageSource>,
        marker: Arc<dyn MarkerStore>,
        bus: EventBus,
    ) -> Self {
        Controller::new(
            config,
            source,
            marker,
            bus,
            Box::new(|config: &SyncConfig| -> Result<HttpTransport> {
                Ok(HttpTransport::new(config.timeout())?)
            }),
        )
    }
}

impl<T: Transport + 'static> Controller<T> {
    pub fn new(
        config: SyncConfig,
        source: Arc<dyn MessageSource>,
        marker: Arc<dyn MarkerStore>,
        bus: EventBus,
        make_transport: TransportFactory<T>,
    ) -> Self {
        Controller {
            config,
            source,
            marker,
            bus,
            make_transport,
            sink: Arc::new(SinkSlot::new()),
            slot: Arc::new(ProcessorSlot::new()),
            phase: tokio::sync::Mutex::new(Phase::Uninitialized),
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Attach the display that receives delivery outcomes.
    pub fn set_outcome_sink(&self, sink: Arc<dyn OutcomeSink>) {
        self.sink.set(sink);
    }

    pub fn clear_outcome_sink(&self) {
        self.sink.clear();
    }

    /// Current persisted marker.
    pub fn marker(&self) -> Result<MessageId> {
        Ok(self.marker.get()?)
    }

    /// The live processor, if one exists.
    pub fn processor(&self) -> Option<Arc<QueueProcessor<T>>> {
        self.slot.get()
    }

    pub async fn state(&self) -> ControllerState {
        let phase = self.phase.lock().await;
        match *phase {
            Phase::Uninitialized => ControllerState::Uninitialized,
            Phase::Deinitialized => ControllerState::Deinitialized,
            Phase::Initialized { .. } => match self.slot.get() {
                Some(processor) if processor.is_running() => ControllerState::Running,
                _ => ControllerState::Stopped,
            },
        }
    }

    /// Deliver a host event directly, bypassing the bus.
    ///
    /// Returns true if the event carried a received message.
    pub fn notify(&self, event: &HostEvent) -> bool {
        forward_event(event, self.slot.as_ref())
    }

    /// Build the processor, register for events, replay the backlog and
    /// start if configured to.
    ///
    /// # Errors
    ///
    /// [`Error::Lifecycle`] if already initialized, [`Error::Config`] for an
    /// unusable configuration, or any error reading the marker or backlog.
    /// On error nothing stays registered.
    pub async fn init(&self) -> Result<()> {
        let mut phase = self.phase.lock().await;
        if matches!(*phase, Phase::Initialized { .. }) {
            return Err(Error::Lifecycle(
                "synchronizer is already initialized".to_string(),
            ));
        }
        self.config.validate()?;

        let processor = self.create_processor()?;
        let listener = spawn_listener(self.bus.subscribe(), self.slot.clone());

        if let Err(e) = self.bring_up(&processor).await {
            listener.unregister().await;
            self.slot.take();
            return Err(e);
        }

        *phase = Phase::Initialized { listener };
        info!(state = %processor.state(), "synchronizer initialized");
        Ok(())
    }

    async fn bring_up(&self, processor: &QueueProcessor<T>) -> Result<()> {
        self.replay_backlog(processor)?;
        if self.config.auto_start {
            processor.start().await?;
        }
        Ok(())
    }

    /// Unregister from events and stop and discard the processor.
    pub async fn deinit(&self) -> Result<()> {
        let mut phase = self.phase.lock().await;
        if !matches!(*phase, Phase::Initialized { .. }) {
            return Err(Error::Lifecycle(
                "synchronizer is not initialized".to_string(),
            ));
        }
        let Phase::Initialized { listener } =
            std::mem::replace(&mut *phase, Phase::Deinitialized)
        else {
            return Ok(());
        };

        listener.unregister().await;
        if let Some(processor) = self.slot.take() {
            processor.stop().await;
        }
        info!("synchronizer deinitialized");
        Ok(())
    }

    /// Start delivering, rebuilding the processor if a stop discarded it.
    ///
    /// Returns `Ok(false)` if already running.
    pub async fn start_if_not_started(&self) -> Result<bool> {
        let phase = self.phase.lock().await;
        if !matches!(*phase, Phase::Initialized { .. }) {
            return Err(Error::Lifecycle(
                "synchronizer is not initialized".to_string(),
            ));
        }

        let processor = match self.slot.get() {
            Some(processor) => processor,
            None => {
                let processor = self.create_processor()?;
                if let Err(e) = self.replay_backlog(&processor) {
                    self.slot.take();
                    return Err(e);
                }
                processor
            }
        };
        processor.start().await
    }

    /// Stop delivering and discard the processor.
    ///
    /// Returns true only for the call that stopped a running worker.
    pub async fn stop_if_running(&self) -> Result<bool> {
        let phase = self.phase.lock().await;
        if !matches!(*phase, Phase::Initialized { .. }) {
            return Ok(false);
        }
        match self.slot.take() {
            Some(processor) => Ok(processor.stop().await),
            None => Ok(false),
        }
    }

    fn create_processor(&self) -> Result<Arc<QueueProcessor<T>>> {
        let transport = (self.make_transport)(&self.config)?;
        let processor = Arc::new(QueueProcessor::new(
            self.config.clone(),
            transport,
            Arc::clone(&self.marker),
            self.sink.clone(),
        )?);
        self.slot.install(Arc::clone(&processor));
        Ok(processor)
    }

    /// Queue everything above the marker, then the live events held while
    /// scanning.
    fn replay_backlog(&self, processor: &QueueProcessor<T>) -> Result<usize> {
        let marker = self.marker.get()?;
        let backlog = self.source.fetch_after(marker)?;
        let count = processor.queue_all(backlog)?;
        let held = self.slot.release()?;
        info!(count, held, marker = %marker, "replayed backlog");
        Ok(count)
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
