//! mcpdesk connection manager and reply dispatch.
//!
//! [`ConnectionManager`] owns the one live endpoint connection. It looks
//! endpoints up in a [`domain::ServerStore`], builds clients through a
//! [`domain::TransportFactory`], and hands every successful reply to the
//! [`ReplyDispatcher`], which pushes it to the single UI subscriber.
//!
//! ## Architectural Layer
//!
//! **Orchestration layer.** Sequences calls between the registry and the
//! transports. Contains no transport or storage details of its own.

mod dispatcher;
mod manager;

pub use dispatcher::{ReplyDispatcher, DEFAULT_REPLY_BUFFER};
pub use manager::ConnectionManager;
