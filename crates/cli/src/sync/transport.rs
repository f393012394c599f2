// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for message delivery.
//!
//! Provides a trait-based transport layer that enables:
//! - Real HTTP delivery for production
//! - Mock transports for unit testing

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use msync_core::Message;

use crate::config::{RequestMethod, SyncConfig};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Could not reach the endpoint.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The endpoint answered with a non-2xx status.
    #[error("endpoint returned status {code}")]
    Status { code: u16 },

    /// The request could not be built or sent.
    #[error("request failed: {0}")]
    Request(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Where and how a message is delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub url: String,
    pub method: RequestMethod,
    /// Parameter templates, rendered per message.
    pub params: BTreeMap<String, String>,
}

impl Endpoint {
    pub fn from_config(config: &SyncConfig) -> Self {
        Endpoint {
            url: config.url.clone(),
            method: config.method,
            params: config.params.clone(),
        }
    }

    /// Short description used in outcome log lines, e.g. `POST https://host/path`.
    pub fn describe(&self) -> String {
        format!("{} {}", self.method, self.url)
    }

    /// Substitute message fields into every parameter value.
    pub fn render_params(&self, message: &Message) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(key, template)| (key.clone(), render_template(template, message)))
            .collect()
    }
}

/// Replace `${field}` placeholders with values from `message`.
///
/// Known fields: `id`, `sender`, `recipient`, `body`, `timestamp` (RFC 3339).
/// Anything else, including an unterminated `${`, is copied verbatim.
pub fn render_template(template: &str, message: &Message) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find('}') else {
            out.push_str(&rest[start..]);
            return out;
        };
        let name = &after[..end];
        match name {
            "id" => out.push_str(&message.id.to_string()),
            "sender" => out.push_str(&message.sender),
            "recipient" => out.push_str(&message.recipient),
            "body" => out.push_str(&message.body),
            "timestamp" => out.push_str(&message.recorded_at.to_rfc3339()),
            _ => out.push_str(&rest[start..start + 2 + end + 1]),
        }
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    out
}

/// Delivers one message per call.
///
/// Implementations must be safe to share with the worker task; the worker
/// never issues two deliveries at once.
pub trait Transport: Send + Sync {
    /// Perform a single delivery attempt.
    fn deliver<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        message: &'a Message,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>>;
}

/// HTTP transport implementation using reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a transport whose requests time out after `timeout`.
    pub fn new(timeout: Duration) -> TransportResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("msync/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Request(e.to_string()))?;
        Ok(HttpTransport { client })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::ConnectionFailed(e.to_string())
    } else {
        TransportError::Request(e.to_string())
    }
}

impl Transport for HttpTransport {
    fn deliver<'a>(
        &'a self,
        endpoint: &'a Endpoint,
        message: &'a Message,
    ) -> Pin<Box<dyn Future<Output = TransportResult<()>> + Send + 'a>> {
        Box::pin(async move {
            let params = endpoint.render_params(message);
            let request = match endpoint.method {
                RequestMethod::Get => self.client.get(&endpoint.url).query(&params),
                RequestMethod::Post => self.client.post(&endpoint.url).form(&params),
                RequestMethod::Put => self.client.put(&endpoint.url).form(&params),
            };

            let response = request.send().await.map_err(map_reqwest_error)?;
            let status = response.status();
            if !status.is_success() {
                return Err(TransportError::Status {
                    code: status.as_u16(),
                });
            }
            Ok(())
        })
    }
}
