// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! msync-core: Shared library for the msync message synchronizer
//!
//! This crate provides the message data model and the durable collaborators
//! the synchronization engine is built on: the message store the engine reads
//! from and the marker store recording how far delivery has progressed.

pub mod error;
pub mod event;
pub mod marker;
pub mod message;
pub mod source;
pub mod store;

pub use error::{Error, Result};
pub use event::HostEvent;
pub use marker::{FileMarkerStore, MarkerStore, MemoryMarkerStore};
pub use message::{Message, MessageId, MessageKind};
pub use source::MessageSource;
pub use store::SqliteMessageStore;
