// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Host event plumbing.
//!
//! The host publishes [`HostEvent`](msync_core::HostEvent)s on an
//! [`EventBus`]. A listener task forwards saves of received messages to
//! whatever [`MessageTarget`] it was registered with; all other events are
//! ignored. [`StoreWatcher`] stands in for a host by polling the message
//! store for new rows.

mod bus;
mod listener;
mod watcher;

pub use bus::{EventBus, DEFAULT_CAPACITY};
pub use listener::{forward_event, spawn_listener, ListenerHandle, MessageTarget};
pub use watcher::StoreWatcher;
