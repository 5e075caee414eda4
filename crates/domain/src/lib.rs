//! Core domain for mcpdesk.
//!
//! This crate contains every domain concept shared by the endpoint registry,
//! the transport clients, and the connection manager: newtype identifiers,
//! the persisted [`ServerDescriptor`], the error taxonomy surfaced to the UI
//! boundary, and the port traits infrastructure crates implement.
//!
//! ## Architectural Layer
//!
//! **Domain types + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype identifiers (`ServerId`, `SessionId`) |
//! | [`types`] | Value types (`ServerDescriptor`, `Port`, `TransportKind`, `Reply`, `Timestamp`) |
//! | [`errors`] | Registry, transport, and connection error types |
//! | [`ports`] | `ServerStore`, `TransportClient`, `TransportFactory` traits |

pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use errors::{ConnectionError, RegistryError, TransportError};
pub use identifiers::{ServerId, SessionId};
pub use ports::{ServerStore, TransportClient, TransportFactory};
pub use types::{InvalidPort, Port, Reply, ServerDescriptor, Timestamp, TransportKind};
