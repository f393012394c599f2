// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Show configuration, marker and backlog size.

use msync_core::{MarkerStore, MessageId};
use serde::Serialize;

use super::Context;
use crate::cli::OutputFormat;
use crate::config::RequestMethod;
use crate::error::Result;

#[derive(Debug, Serialize)]
pub(crate) struct StatusReport {
    pub url: String,
    pub method: RequestMethod,
    pub auto_start: bool,
    pub marker: MessageId,
    /// Received messages above the marker.
    pub backlog: usize,
}

pub fn run(ctx: &Context, output: OutputFormat) -> Result<()> {
    let report = report(ctx)?;
    match output {
        OutputFormat::Text => {
            let url = if report.url.is_empty() {
                "(not set)"
            } else {
                report.url.as_str()
            };
            println!("URL: {}", url);
            println!("Method: {}", report.method);
            println!(
                "Auto start: {}",
                if report.auto_start { "yes" } else { "no" }
            );
            println!("Marker: {}", report.marker);
            println!("Backlog: {}", report.backlog);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

pub(crate) fn report(ctx: &Context) -> Result<StatusReport> {
    let config = ctx.load_config()?.sync;
    let marker = ctx.marker_store(config.last_synced_id)?.get()?;
    let backlog = ctx.open_store()?.count_after(marker)?;
    Ok(StatusReport {
        url: config.url,
        method: config.method,
        auto_start: config.auto_start,
        marker,
        backlog,
    })
}

#[cfg(test)]
#[path = "status_tests.rs"]
mod tests;
