//! Error taxonomy for the registry, the transports, and the connection manager.
//!
//! The `Display` text of every variant is the exact message the UI boundary
//! shows, so the bridge renders `error.to_string()` and never re-words it.
//!
//! A failed read of the registry document is deliberately absent: it
//! degrades to an empty registry inside the store and is never surfaced.

use thiserror::Error;

use crate::ServerId;

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Errors returned by a [`crate::ServerStore`] mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// `add` was called with an id that is already registered. The registry
    /// is left unchanged.
    #[error("Server ID already exists")]
    DuplicateId {
        /// The conflicting id.
        id: ServerId,
    },

    /// `update` was called with an id that is not registered.
    #[error("Server not found")]
    NotFound {
        /// The unknown id.
        id: ServerId,
    },

    /// The registry document could not be written.
    #[error("Failed to save server list: {message}")]
    Write {
        /// Underlying I/O or serialisation error text.
        message: String,
    },
}

// ---------------------------------------------------------------------------
// Transport
// ---------------------------------------------------------------------------

/// Errors raised by a [`crate::TransportClient`].
///
/// The message is the raw detail: OS error text for socket failures, or the
/// server-supplied `error` field (falling back to the transport error text)
/// for HTTP failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// The handshake with the endpoint failed.
    #[error("{message}")]
    Connect {
        /// Detail text.
        message: String,
    },

    /// A request failed in transit or the endpoint signalled an error.
    #[error("{message}")]
    Send {
        /// Detail text.
        message: String,
    },
}

impl TransportError {
    /// Builds a [`TransportError::Connect`].
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect {
            message: message.into(),
        }
    }

    /// Builds a [`TransportError::Send`].
    pub fn send(message: impl Into<String>) -> Self {
        Self::Send {
            message: message.into(),
        }
    }

    /// Returns the detail text regardless of variant.
    pub fn message(&self) -> &str {
        match self {
            Self::Connect { message } | Self::Send { message } => message,
        }
    }
}

// ---------------------------------------------------------------------------
// Connection manager
// ---------------------------------------------------------------------------

/// Errors returned by the connection manager.
///
/// None of these is fatal: after any of them the manager remains usable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    /// `connect_to` named an id that is not in the registry.
    #[error("Server not found")]
    ServerNotFound {
        /// The unknown id.
        id: ServerId,
    },

    /// The transport handshake failed; no connection is installed.
    #[error("Failed to connect: {message}")]
    ConnectFailed {
        /// Transport detail text.
        message: String,
    },

    /// A send was attempted with nothing connected. No I/O was performed.
    #[error("No MCP server connected.")]
    NoActiveConnection,

    /// The request failed; the active connection is left in place.
    #[error("Failed to send message: {message}")]
    SendFailed {
        /// Transport or server-supplied detail text.
        message: String,
    },
}
