//! Stateless HTTP transport.
//!
//! `POST http://{host}:{port}{path}` with body `{"message": "..."}`.
//! A 2xx response yields its `reply` field (empty when absent). Anything
//! else becomes a send error carrying the body's `error` field, or the
//! transport error text when the body has none.

use async_trait::async_trait;
use domain::{ServerDescriptor, TransportClient, TransportError, TransportKind};
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

/// Path HTTP endpoints receive messages on unless configured otherwise.
pub const DEFAULT_MESSAGE_PATH: &str = "/mcp/message";

#[derive(Serialize)]
struct MessageRequest<'a> {
    message: &'a str,
}

/// A [`TransportClient`] for endpoints with `protocol = "http"`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    url: String,
}

impl HttpClient {
    /// Creates a client posting to `path` on the descriptor's host and port.
    pub fn new(client: reqwest::Client, descriptor: &ServerDescriptor, path: &str) -> Self {
        Self {
            client,
            url: format!("http://{}{}", descriptor.address(), path),
        }
    }

    /// Returns the URL messages are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl TransportClient for HttpClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Http
    }

    // Nothing to establish.
    async fn connect(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn send(&mut self, message: &str) -> Result<String, TransportError> {
        let response = self
            .client
            .post(&self.url)
            .json(&MessageRequest { message })
            .send()
            .await
            .map_err(|e| TransportError::send(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::send(e.to_string()))?;
        debug!(url = %self.url, status = status.as_u16(), "HTTP round trip complete");

        if !status.is_success() {
            let message = string_field(&body, "error")
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("Request failed with status code {}", status.as_u16()));
            return Err(TransportError::send(message));
        }

        Ok(string_field(&body, "reply").unwrap_or_default())
    }

    async fn disconnect(&mut self) {}
}

/// Extracts a top-level string field from a JSON object body.
fn string_field(body: &str, field: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    value.get(field)?.as_str().map(str::to_owned)
}
