// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! msync - deliver locally recorded messages to a remote collection endpoint.
//!
//! This crate provides the synchronization engine behind the `msync` CLI:
//! every received message is delivered once, in recording order, and a
//! persisted marker records how far delivery has progressed so restarts pick
//! up where the last run stopped.
//!
//! # Main Components
//!
//! - [`sync`] - work queue, transport and the queue processor
//! - [`events`] - event bus and the notification listener
//! - [`Controller`] - wiring, backlog replay and lifecycle
//! - [`Config`] - endpoint configuration
//! - [`Error`] - error types for all operations
//!
//! # Embedding
//!
//! ```rust,ignore
//! use msync::{Controller, EventBus, SyncConfig};
//!
//! let controller = Controller::http(config, store, marker, bus.clone());
//! controller.init().await?;
//! bus.publish(HostEvent::MessageSaved(message));
//! ```

mod cli;
mod commands;
mod logging;

pub mod config;
pub mod controller;
pub mod env;
pub mod error;
pub mod events;
pub mod sync;

pub use cli::{Cli, Command, OutputFormat};
pub use config::{Config, MarkerPolicy, RequestMethod, RetryConfig, SyncConfig};
pub use controller::{Controller, ControllerState};
pub use error::{Error, Result};
pub use events::EventBus;

use commands::Context;

/// Execute a parsed command line.
pub fn run(cli: Cli) -> Result<()> {
    let ctx = Context::new(cli.state_dir, cli.config);
    match cli.command {
        Command::Run { start, poll_ms } => commands::run::run(&ctx, start, poll_ms),
        Command::Status { output } => commands::status::run(&ctx, output),
        Command::Record {
            from,
            to,
            outbound,
            body,
        } => commands::record::run(&ctx, &from, &to, outbound, &body),
    }
}
