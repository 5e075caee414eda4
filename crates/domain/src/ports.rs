//! Port traits implemented by infrastructure crates.
//!
//! | Trait | Implemented by |
//! |-------|----------------|
//! | [`ServerStore`] | `registry::JsonFileStore` |
//! | [`TransportClient`] | `transport::SocketClient`, `transport::HttpClient` |
//! | [`TransportFactory`] | `transport::DefaultTransportFactory` |

use async_trait::async_trait;

use crate::{RegistryError, ServerDescriptor, ServerId, TransportError, TransportKind};

/// Durable, ordered collection of endpoint descriptors.
///
/// Every mutation reads the whole registry, applies one change, and writes
/// the whole registry back. Reads never fail: an unreadable backing store is
/// reported as an empty registry.
#[async_trait]
pub trait ServerStore: Send + Sync {
    /// Returns every descriptor in insertion order.
    async fn list(&self) -> Vec<ServerDescriptor>;

    /// Returns the descriptor registered under `id`, if any.
    async fn get(&self, id: &ServerId) -> Option<ServerDescriptor> {
        self.list().await.into_iter().find(|d| &d.id == id)
    }

    /// Appends `descriptor`.
    ///
    /// Fails with [`RegistryError::DuplicateId`] (registry untouched) if the
    /// id is already present.
    async fn add(&self, descriptor: ServerDescriptor) -> Result<(), RegistryError>;

    /// Replaces the descriptor with the same id, keeping its position.
    ///
    /// Fails with [`RegistryError::NotFound`] if the id is not present.
    async fn update(&self, descriptor: ServerDescriptor) -> Result<(), RegistryError>;

    /// Removes the descriptor with `id`. Removing an unknown id succeeds.
    async fn remove(&self, id: &ServerId) -> Result<(), RegistryError>;
}

/// A client for one endpoint.
///
/// State machine: `Unconnected -> Connecting -> Connected -> Disconnected`.
/// Only one request may be in flight per client; callers serialise sends.
#[async_trait]
pub trait TransportClient: Send + Sync {
    /// Which transport this client speaks.
    fn kind(&self) -> TransportKind;

    /// Establishes the connection. A no-op for stateless transports.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Sends one message and returns the complete reply text.
    async fn send(&mut self, message: &str) -> Result<String, TransportError>;

    /// Releases the connection. Always succeeds, including when never
    /// connected or already disconnected.
    async fn disconnect(&mut self);
}

/// Builds a fresh, unconnected [`TransportClient`] for a descriptor.
pub trait TransportFactory: Send + Sync {
    /// Creates a client matching `descriptor.protocol`.
    fn create(&self, descriptor: &ServerDescriptor) -> Box<dyn TransportClient>;
}
