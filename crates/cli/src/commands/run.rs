// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Run the synchronizer in the foreground until Ctrl-C.
//!
//! Stands in for the host application: the message store is polled for new
//! rows, which are published on the event bus the controller listens to.

use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::Context;
use crate::config::SyncConfig;
use crate::controller::Controller;
use crate::error::{Error, Result};
use crate::events::{EventBus, StoreWatcher};
use crate::logging::{setup_logging, LOG_FILE};
use crate::sync::{DeliveryOutcome, HttpTransport, OutcomeSink, ProcessorStats, TracingSink};

const LOCK_FILE: &str = "msync.lock";

/// Prints each outcome for the operator and logs it.
struct PrintSink;

impl OutcomeSink for PrintSink {
    fn report(&self, outcome: &DeliveryOutcome) {
        println!("{}", outcome.log_line());
        TracingSink.report(outcome);
    }
}

pub fn run(ctx: &Context, force_start: bool, poll_ms: u64) -> Result<()> {
    fs::create_dir_all(&ctx.state_dir)?;
    let _lock = acquire_lock(&ctx.state_dir.join(LOCK_FILE))?;
    setup_logging(&ctx.state_dir.join(LOG_FILE));

    let config = ctx.load_config()?.sync;
    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(serve(ctx, config, force_start, Duration::from_millis(poll_ms)))
}

async fn serve(
    ctx: &Context,
    config: SyncConfig,
    force_start: bool,
    poll_interval: Duration,
) -> Result<()> {
    let store = Arc::new(ctx.open_store()?);
    let marker = Arc::new(ctx.marker_store(config.last_synced_id)?);
    let bus = EventBus::default();

    // Rows up to here are covered by the backlog replay in init.
    let cancel = CancellationToken::new();
    let watcher = StoreWatcher::new(Arc::clone(&store), bus.clone(), poll_interval)
        .spawn(store.max_id()?, cancel.clone());

    let controller = Controller::http(config, store, marker, bus);
    controller.set_outcome_sink(Arc::new(PrintSink));

    let result = drive(&controller, force_start).await;

    cancel.cancel();
    join_watcher(watcher).await;
    result
}

/// Wait for the watcher task, logging a panic or cancellation.
async fn join_watcher(watcher: JoinHandle<()>) {
    if let Err(e) = watcher.await {
        warn!("store watcher ended abnormally: {}", e);
    }
}

async fn drive(controller: &Controller<HttpTransport>, force_start: bool) -> Result<()> {
    controller.init().await?;
    let result = wait_for_interrupt(controller, force_start).await;
    controller.deinit().await?;
    result
}

async fn wait_for_interrupt(controller: &Controller<HttpTransport>, force_start: bool) -> Result<()> {
    if force_start {
        controller.start_if_not_started().await?;
    }

    let marker = controller.marker()?;
    println!(
        "msync {} (marker {}), press Ctrl-C to exit",
        controller.state().await,
        marker
    );
    info!(marker = %marker, "waiting for messages");

    tokio::signal::ctrl_c().await?;
    info!("interrupted, shutting down");
    if let Some(processor) = controller.processor() {
        println!("{}", summary(&processor.stats()));
    }
    Ok(())
}

/// One-line tally printed on shutdown.
fn summary(stats: &ProcessorStats) -> String {
    format!(
        "Delivered {}, failed {}, pending {}",
        stats.delivered, stats.failed, stats.pending
    )
}

fn acquire_lock(lock_path: &Path) -> Result<fs::File> {
    use fs2::FileExt;

    let file = fs::OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(lock_path)?;
    file.try_lock_exclusive().map_err(|_| {
        Error::Lifecycle(format!(
            "another msync instance is already running (lock held on {})",
            lock_path.display()
        ))
    })?;
    Ok(file)
}

#[cfg(test)]
#[path = "run_tests.rs"]
mod tests;
