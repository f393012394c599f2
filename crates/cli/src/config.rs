// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Synchronizer configuration.
//!
//! Configuration is stored in `<state_dir>/config.toml` and read once when a
//! queue processor is created. Changing it means building a new processor.
//!
//! ```toml
//! [sync]
//! url = "https://collector.example/api/sms"
//! method = "POST"
//! auto_start = true
//!
//! [sync.params]
//! from = "${sender}"
//! text = "${body}"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use msync_core::MessageId;

use crate::error::{Error, Result};

const CONFIG_FILE_NAME: &str = "config.toml";

/// Top-level configuration file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub sync: SyncConfig,
}

/// HTTP method used for delivery requests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RequestMethod {
    /// Parameters travel in the query string.
    Get,
    /// Parameters travel as a form-encoded body.
    #[default]
    Post,
    /// Like `Post`, with PUT semantics.
    Put,
}

impl RequestMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestMethod::Get => "GET",
            RequestMethod::Post => "POST",
            RequestMethod::Put => "PUT",
        }
    }
}

impl fmt::Display for RequestMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for RequestMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_uppercase().as_str() {
            "GET" => Ok(RequestMethod::Get),
            "POST" => Ok(RequestMethod::Post),
            "PUT" => Ok(RequestMethod::Put),
            _ => Err(Error::Config(format!(
                "invalid request method '{}': must be GET, POST or PUT",
                s
            ))),
        }
    }
}

/// When the marker may advance after a successful delivery.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerPolicy {
    /// Never advance past a message whose delivery failed in this
    /// processor's lifetime and has not succeeded since, nor past a lower id
    /// still waiting in the queue.
    #[default]
    Sequential,
    /// Advance to the highest successfully delivered id, gaps or not.
    Highest,
}

/// In-process retry settings for a single queue entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delivery attempts per entry, including the first (1 = no retry).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,
    /// Upper bound for the backoff delay in seconds.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        RetryConfig {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl RetryConfig {
    /// Backoff before retry number `retry` (1-based), doubling with a cap.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u64
            .checked_shl(retry.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay_ms = self.initial_delay_ms.saturating_mul(factor);
        Duration::from_millis(std::cmp::min(
            delay_ms,
            self.max_delay_secs.saturating_mul(1000),
        ))
    }
}

fn default_max_attempts() -> u32 {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    30
}

/// Remote collection endpoint and delivery behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Endpoint URL (http or https).
    #[serde(default)]
    pub url: String,
    /// HTTP method (default: POST).
    #[serde(default)]
    pub method: RequestMethod,
    /// Start delivering as soon as the synchronizer is initialized.
    #[serde(default)]
    pub auto_start: bool,
    /// Marker reported before anything has been persisted.
    #[serde(default)]
    pub last_synced_id: MessageId,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub marker_policy: MarkerPolicy,
    /// Request parameters. Values may contain `${id}`, `${sender}`,
    /// `${recipient}`, `${body}` and `${timestamp}` placeholders.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for SyncConfig {
    fn default() -> Self {
        SyncConfig {
            url: String::new(),
            method: RequestMethod::default(),
            auto_start: false,
            last_synced_id: MessageId::ZERO,
            timeout_secs: default_timeout_secs(),
            marker_policy: MarkerPolicy::default(),
            params: BTreeMap::new(),
            retry: RetryConfig::default(),
        }
    }
}

impl SyncConfig {
    /// Creates a config for the given URL with defaults for everything else.
    pub fn new(url: impl Into<String>) -> Self {
        SyncConfig {
            url: url.into(),
            ..SyncConfig::default()
        }
    }

    /// Checks that the config can drive a processor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for a missing or malformed URL, a non-http
    /// scheme, zero retry attempts, or a zero request timeout.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config("synchronization URL is not set".to_string()));
        }
        let parsed = reqwest::Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("invalid synchronization URL '{}': {}", self.url, e)))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(Error::Config(format!(
                "invalid synchronization URL '{}': scheme must be http or https",
                self.url
            )));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(Error::Config(
                "timeout_secs must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Path of the config file inside the state directory.
    pub fn path_in(state_dir: &Path) -> PathBuf {
        state_dir.join(CONFIG_FILE_NAME)
    }

    /// Loads configuration from the given file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("failed to read config {}: {}", path.display(), e))
        })?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Loads the config if the file exists.
    pub fn load_optional(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        Self::load(path).map(Some)
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
