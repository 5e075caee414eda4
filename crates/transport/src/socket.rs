//! Persistent TCP transport.
//!
//! Wire format: the request is the message text followed by a single `\n`.
//! The reply is whatever bytes arrive in the first read after the write,
//! decoded as UTF-8 (invalid sequences replaced). There is no length prefix
//! and no reassembly: a reply split across TCP segments is truncated to the
//! first one. Exactly one request may be in flight.

use std::time::Duration;

use async_trait::async_trait;
use domain::{ServerDescriptor, TransportClient, TransportError, TransportKind};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::{debug, warn};

use crate::within;

/// Size of the single read that receives a reply.
pub const READ_BUFFER_SIZE: usize = 64 * 1024;

/// Lifecycle of a [`SocketClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketState {
    /// No connect attempted yet.
    Unconnected,
    /// A connect is in progress.
    Connecting,
    /// The stream is open.
    Connected,
    /// The last connect attempt failed.
    Failed,
    /// Closed locally or by the peer.
    Disconnected,
}

/// A [`TransportClient`] holding one TCP stream to `host:port`.
#[derive(Debug)]
pub struct SocketClient {
    descriptor: ServerDescriptor,
    connect_timeout: Option<Duration>,
    request_timeout: Option<Duration>,
    stream: Option<TcpStream>,
    state: SocketState,
}

impl SocketClient {
    /// Creates an unconnected client for `descriptor`.
    pub fn new(descriptor: ServerDescriptor) -> Self {
        Self {
            descriptor,
            connect_timeout: None,
            request_timeout: None,
            stream: None,
            state: SocketState::Unconnected,
        }
    }

    /// Bounds how long `connect` may take.
    #[must_use]
    pub fn with_connect_timeout(mut self, limit: Option<Duration>) -> Self {
        self.connect_timeout = limit;
        self
    }

    /// Bounds how long one `send` round trip may take.
    #[must_use]
    pub fn with_request_timeout(mut self, limit: Option<Duration>) -> Self {
        self.request_timeout = limit;
        self
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> SocketState {
        self.state
    }

    async fn round_trip(stream: &mut TcpStream, message: &str) -> std::io::Result<String> {
        let mut frame = Vec::with_capacity(message.len() + 1);
        frame.extend_from_slice(message.as_bytes());
        frame.push(b'\n');
        stream.write_all(&frame).await?;

        let mut buf = vec![0u8; READ_BUFFER_SIZE];
        let n = stream.read(&mut buf).await?;
        if n == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "connection closed by peer",
            ));
        }
        Ok(String::from_utf8_lossy(&buf[..n]).into_owned())
    }
}

#[async_trait]
impl TransportClient for SocketClient {
    fn kind(&self) -> TransportKind {
        TransportKind::Socket
    }

    async fn connect(&mut self) -> Result<(), TransportError> {
        if let Some(mut stale) = self.stream.take() {
            let _ = stale.shutdown().await;
        }
        self.state = SocketState::Connecting;

        let addr = (self.descriptor.host.as_str(), self.descriptor.port.as_u16());
        match within(self.connect_timeout, TcpStream::connect(addr)).await {
            Ok(stream) => {
                debug!(address = %self.descriptor.address(), "Socket connected");
                self.stream = Some(stream);
                self.state = SocketState::Connected;
                Ok(())
            }
            Err(e) => {
                warn!(address = %self.descriptor.address(), error = %e, "Socket connect failed");
                self.state = SocketState::Failed;
                Err(TransportError::connect(e.to_string()))
            }
        }
    }

    async fn send(&mut self, message: &str) -> Result<String, TransportError> {
        let Some(stream) = self.stream.as_mut() else {
            return Err(TransportError::send("Not connected"));
        };

        let reply = within(self.request_timeout, Self::round_trip(stream, message))
            .await
            .map_err(|e| TransportError::send(e.to_string()))?;
        debug!(sent = message.len(), received = reply.len(), "Socket round trip complete");
        Ok(reply)
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Socket shutdown reported an error");
            }
        }
        self.state = SocketState::Disconnected;
    }
}
