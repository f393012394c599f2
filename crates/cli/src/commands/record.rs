// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Record a message into the store, as the host application would.

use chrono::Utc;
use msync_core::{Message, MessageKind};

use super::Context;
use crate::error::Result;

pub fn run(ctx: &Context, from: &str, to: &str, outbound: bool, body: &str) -> Result<()> {
    let message = record(ctx, from, to, outbound, body)?;
    println!("Recorded {} message {}", message.kind, message.id);
    Ok(())
}

pub(crate) fn record(
    ctx: &Context,
    from: &str,
    to: &str,
    outbound: bool,
    body: &str,
) -> Result<Message> {
    let kind = if outbound {
        MessageKind::Outbound
    } else {
        MessageKind::Received
    };
    let store = ctx.open_store()?;
    Ok(store.record(kind, from, to, body, Utc::now())?)
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
