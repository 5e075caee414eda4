//! mcpdesk boundary adapter.
//!
//! [`Bridge`] is the surface the UI process calls. Every operation returns a
//! JSON-serialisable [`BridgeResponse`] envelope and never an `Err`: failures
//! become `{"error": "..."}` with the message the UI displays verbatim.
//! Replies arrive separately, as [`MessageEvent`]s on the stream returned by
//! [`Bridge::subscribe`].
//!
//! | Operation | Success | Failure |
//! |-----------|---------|---------|
//! | [`Bridge::list_servers`] | descriptor array | (never fails) |
//! | [`Bridge::add_server`] | `{success:true}` | `Server ID already exists` |
//! | [`Bridge::update_server`] | `{success:true}` | `Server not found` |
//! | [`Bridge::remove_server`] | `{success:true}` | (write failures only) |
//! | [`Bridge::connect_server`] | `{success:true, serverId}` | `Server not found`, `Failed to connect: ...` |
//! | [`Bridge::send_message`] | `{success:true}` + push event | `No MCP server connected.`, `Failed to send message: ...` |
//! | [`Bridge::disconnect_server`] | `{success:true}` | (never fails) |

use std::sync::Arc;

use connection::ConnectionManager;
use domain::{Reply, ServerDescriptor, ServerId, ServerStore};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;

/// Sender tag on every pushed reply.
pub const SYSTEM_SENDER: &str = "system";

// ---------------------------------------------------------------------------
// Envelopes
// ---------------------------------------------------------------------------

/// Result of one bridge operation, shaped for the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum BridgeResponse {
    /// `{"success": true}` or `{"success": true, "serverId": "..."}`.
    Success(Acknowledgement),
    /// `{"error": "..."}`.
    Error { error: String },
}

/// Body of a success envelope. `success` is always serialised as `true`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Acknowledgement {
    #[serde(serialize_with = "always_true")]
    success: (),
    #[serde(rename = "serverId", skip_serializing_if = "Option::is_none")]
    server_id: Option<ServerId>,
}

impl Acknowledgement {
    /// The endpoint a connect request attached to.
    pub fn server_id(&self) -> Option<&ServerId> {
        self.server_id.as_ref()
    }
}

fn always_true<S: serde::Serializer>(_: &(), serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_bool(true)
}

impl BridgeResponse {
    /// `{"success": true}`.
    pub fn ok() -> Self {
        Self::Success(Acknowledgement {
            success: (),
            server_id: None,
        })
    }

    /// `{"success": true, "serverId": id}`.
    pub fn connected(server_id: ServerId) -> Self {
        Self::Success(Acknowledgement {
            success: (),
            server_id: Some(server_id),
        })
    }

    /// `{"error": message}`.
    pub fn error(error: impl std::fmt::Display) -> Self {
        Self::Error {
            error: error.to_string(),
        }
    }

    /// Returns `true` for the success envelope.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }
}

impl<E: std::fmt::Display> From<Result<(), E>> for BridgeResponse {
    fn from(result: Result<(), E>) -> Self {
        match result {
            Ok(()) => Self::ok(),
            Err(e) => Self::error(e),
        }
    }
}

/// A reply pushed to the UI after a successful send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEvent {
    /// Always [`SYSTEM_SENDER`].
    pub sender: String,
    /// Reply text exactly as received.
    pub content: String,
    /// RFC 3339 UTC time the reply was captured.
    pub timestamp: String,
}

impl From<Reply> for MessageEvent {
    fn from(reply: Reply) -> Self {
        Self {
            sender: SYSTEM_SENDER.to_string(),
            content: reply.content,
            timestamp: reply.timestamp.to_string(),
        }
    }
}

/// Stream of [`MessageEvent`]s for the single UI subscriber.
#[derive(Debug)]
pub struct MessageEvents {
    rx: mpsc::Receiver<Reply>,
}

impl MessageEvents {
    /// Waits for the next event. `None` once the subscription was replaced
    /// or the bridge dropped.
    pub async fn recv(&mut self) -> Option<MessageEvent> {
        self.rx.recv().await.map(MessageEvent::from)
    }

    /// Returns an already-delivered event without waiting.
    pub fn try_recv(&mut self) -> Option<MessageEvent> {
        self.rx.try_recv().ok().map(MessageEvent::from)
    }
}

// ---------------------------------------------------------------------------
// Bridge
// ---------------------------------------------------------------------------

/// The UI-facing facade over the registry and the connection manager.
pub struct Bridge {
    store: Arc<dyn ServerStore>,
    connections: Arc<ConnectionManager>,
}

impl Bridge {
    /// Creates a bridge over `store` and the shared connection manager.
    pub fn new(store: Arc<dyn ServerStore>, connections: Arc<ConnectionManager>) -> Self {
        Self { store, connections }
    }

    /// Registers the UI as the reply subscriber, replacing any previous one.
    pub fn subscribe(&self, capacity: usize) -> MessageEvents {
        MessageEvents {
            rx: self.connections.dispatcher().subscribe(capacity),
        }
    }

    /// Returns every registered server in insertion order.
    pub async fn list_servers(&self) -> Vec<ServerDescriptor> {
        self.store.list().await
    }

    /// Registers a new server; rejects a duplicate id.
    pub async fn add_server(&self, descriptor: ServerDescriptor) -> BridgeResponse {
        self.store.add(descriptor).await.into()
    }

    /// Replaces the server with the same id.
    pub async fn update_server(&self, descriptor: ServerDescriptor) -> BridgeResponse {
        self.store.update(descriptor).await.into()
    }

    /// Removes a server. Unknown ids succeed.
    pub async fn remove_server(&self, id: &ServerId) -> BridgeResponse {
        self.store.remove(id).await.into()
    }

    /// Makes `id` the active connection, closing any previous one.
    pub async fn connect_server(&self, id: &ServerId) -> BridgeResponse {
        match self.connections.connect_to(id).await {
            Ok(server_id) => BridgeResponse::connected(server_id),
            Err(e) => BridgeResponse::error(e),
        }
    }

    /// Sends on the active connection; the reply is pushed to the subscriber.
    pub async fn send_message(&self, message: &str) -> BridgeResponse {
        let response: BridgeResponse = self.connections.send_to_active(message).await.into();
        debug!(success = response.is_success(), "send_message handled");
        response
    }

    /// Closes the active connection, if any.
    pub async fn disconnect_server(&self) -> BridgeResponse {
        self.connections.disconnect_active().await;
        BridgeResponse::ok()
    }

    /// Returns the id of the connected endpoint, if any.
    pub async fn connected_server(&self) -> Option<ServerId> {
        self.connections.active_server().await
    }
}
