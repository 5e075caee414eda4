//! mcpdesk transport clients.
//!
//! Implements [`domain::TransportClient`] for the two endpoint kinds and
//! [`domain::TransportFactory`] to pick between them per descriptor:
//!
//! - [`SocketClient`] — `protocol = "tcp"` (default). A persistent TCP stream;
//!   each request is the message followed by `\n`, and the first chunk of
//!   bytes read afterwards is the whole reply.
//! - [`HttpClient`] — `protocol = "http"`. Stateless; each request is a
//!   `POST {"message": ...}` to [`DEFAULT_MESSAGE_PATH`], the reply is the
//!   `reply` field of the JSON response.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** Framing, HTTP bodies, and error translation live
//! here. The connection manager sees only [`domain::TransportClient`] and
//! never learns which transport it is driving.

mod http;
mod socket;

use std::future::Future;
use std::time::Duration;

use domain::{ServerDescriptor, TransportClient, TransportFactory, TransportKind};
use thiserror::Error;

pub use http::{HttpClient, DEFAULT_MESSAGE_PATH};
pub use socket::{SocketClient, SocketState, READ_BUFFER_SIZE};

/// Tunables shared by every client the factory creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportSettings {
    /// Path HTTP endpoints accept messages on.
    pub http_path: String,
    /// Upper bound on establishing a connection. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Upper bound on one request/reply round trip. `None` waits indefinitely.
    pub request_timeout: Option<Duration>,
}

impl Default for TransportSettings {
    fn default() -> Self {
        Self {
            http_path: DEFAULT_MESSAGE_PATH.to_string(),
            connect_timeout: None,
            request_timeout: None,
        }
    }
}

/// Errors building a [`DefaultTransportFactory`].
#[derive(Debug, Error)]
pub enum TransportSetupError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Creates [`SocketClient`]s and [`HttpClient`]s from descriptors.
///
/// HTTP clients share one connection pool.
#[derive(Debug, Clone)]
pub struct DefaultTransportFactory {
    settings: TransportSettings,
    http: reqwest::Client,
}

impl DefaultTransportFactory {
    /// Builds a factory using `settings`.
    pub fn new(settings: TransportSettings) -> Result<Self, TransportSetupError> {
        let mut builder = reqwest::Client::builder();
        if let Some(limit) = settings.connect_timeout {
            builder = builder.connect_timeout(limit);
        }
        if let Some(limit) = settings.request_timeout {
            builder = builder.timeout(limit);
        }
        Ok(Self {
            settings,
            http: builder.build()?,
        })
    }

    /// Returns the settings clients are created with.
    pub fn settings(&self) -> &TransportSettings {
        &self.settings
    }
}

impl TransportFactory for DefaultTransportFactory {
    fn create(&self, descriptor: &ServerDescriptor) -> Box<dyn TransportClient> {
        match descriptor.protocol {
            TransportKind::Socket => Box::new(
                SocketClient::new(descriptor.clone())
                    .with_connect_timeout(self.settings.connect_timeout)
                    .with_request_timeout(self.settings.request_timeout),
            ),
            TransportKind::Http => Box::new(HttpClient::new(
                self.http.clone(),
                descriptor,
                &self.settings.http_path,
            )),
        }
    }
}

/// Runs `fut`, failing with `TimedOut` if `limit` elapses first.
async fn within<T>(
    limit: Option<Duration>,
    fut: impl Future<Output = std::io::Result<T>>,
) -> std::io::Result<T> {
    match limit {
        None => fut.await,
        Some(limit) => tokio::time::timeout(limit, fut).await.unwrap_or_else(|_| {
            Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("timed out after {}ms", limit.as_millis()),
            ))
        }),
    }
}
