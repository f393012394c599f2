// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Parse a string that must not be empty or whitespace-only.
fn non_empty_string(s: &str) -> Result<String, String> {
    if s.trim().is_empty() {
        Err("cannot be empty".to_string())
    } else {
        Ok(s.to_string())
    }
}

/// Output format for commands supporting structured output.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser)]
#[command(name = "msync")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Deliver recorded messages to a remote collection endpoint")]
#[command(after_help = "\
Get started:
  msync record --from +15550100 \"hello\"   Record a received message
  msync status                            Show marker and backlog
  msync run --start                       Deliver until interrupted")]
pub struct Cli {
    /// State directory holding config.toml, messages.db and the marker
    #[arg(long, global = true, value_name = "DIR")]
    pub state_dir: Option<PathBuf>,

    /// Config file to use instead of <state-dir>/config.toml
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run the synchronizer until interrupted
    Run {
        /// Start delivering even if auto_start is off
        #[arg(long)]
        start: bool,

        /// Interval for picking up newly recorded messages
        #[arg(long, value_name = "MS", default_value_t = 1000)]
        poll_ms: u64,
    },

    /// Show configuration, marker and backlog size
    Status {
        #[arg(long, short = 'o', value_enum, default_value_t)]
        output: OutputFormat,
    },

    /// Record a message into the store
    Record {
        /// Sender address
        #[arg(long = "from", value_parser = non_empty_string)]
        from: String,

        /// Recipient address
        #[arg(long = "to", default_value = "")]
        to: String,

        /// Record as outbound (not synchronized)
        #[arg(long)]
        outbound: bool,

        /// Message body
        #[arg(value_parser = non_empty_string)]
        body: String,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
