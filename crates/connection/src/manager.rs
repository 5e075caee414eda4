//! The single-active-connection manager.
//!
//! The active slot is guarded by one async mutex held for the whole of
//! `connect_to`, `send_to_active`, and `disconnect_active`. Consequently at
//! most one request is in flight, for either transport, and replies reach
//! the dispatcher in the order their sends completed.

use std::sync::Arc;

use domain::{
    ConnectionError, Reply, ServerDescriptor, ServerId, ServerStore, SessionId, TransportClient,
    TransportFactory,
};
use tokio::sync::Mutex;
use tracing::{field, info, instrument, warn, Span};

use crate::ReplyDispatcher;

/// The live connection. Exists only while a connect has succeeded and no
/// disconnect or newer connect has happened since.
struct ActiveConnection {
    descriptor: ServerDescriptor,
    session: SessionId,
    client: Box<dyn TransportClient>,
}

/// Owns at most one live [`TransportClient`] and routes messages to it.
pub struct ConnectionManager {
    store: Arc<dyn ServerStore>,
    transports: Arc<dyn TransportFactory>,
    dispatcher: Arc<ReplyDispatcher>,
    active: Mutex<Option<ActiveConnection>>,
}

impl ConnectionManager {
    /// Creates a manager with no active connection.
    pub fn new(
        store: Arc<dyn ServerStore>,
        transports: Arc<dyn TransportFactory>,
        dispatcher: Arc<ReplyDispatcher>,
    ) -> Self {
        Self {
            store,
            transports,
            dispatcher,
            active: Mutex::new(None),
        }
    }

    /// Returns the dispatcher replies are delivered through.
    pub fn dispatcher(&self) -> &Arc<ReplyDispatcher> {
        &self.dispatcher
    }

    /// Connects to the registered endpoint `id`, replacing any current
    /// connection.
    ///
    /// An unknown id fails before the current connection is touched. Once the
    /// id resolves, the current connection is torn down unconditionally, even
    /// if the new connect then fails; in that case nothing is connected
    /// afterwards.
    #[instrument(skip(self), fields(server_id = %id, session_id = field::Empty))]
    pub async fn connect_to(&self, id: &ServerId) -> Result<ServerId, ConnectionError> {
        let mut active = self.active.lock().await;

        let descriptor = self
            .store
            .get(id)
            .await
            .ok_or_else(|| ConnectionError::ServerNotFound { id: id.clone() })?;

        if let Some(mut previous) = active.take() {
            info!(
                previous = %previous.descriptor.id,
                previous_session = %previous.session,
                "Disconnecting previous server"
            );
            previous.client.disconnect().await;
        }

        let mut client = self.transports.create(&descriptor);
        if let Err(e) = client.connect().await {
            warn!(protocol = %descriptor.protocol, error = %e, "Connect failed");
            client.disconnect().await;
            return Err(ConnectionError::ConnectFailed {
                message: e.message().to_string(),
            });
        }

        let session = SessionId::new_random();
        Span::current().record("session_id", field::display(session));
        info!(protocol = %descriptor.protocol, address = %descriptor.address(), "Connected");

        let id = descriptor.id.clone();
        *active = Some(ActiveConnection {
            descriptor,
            session,
            client,
        });
        Ok(id)
    }

    /// Sends `message` to the connected endpoint and dispatches its reply.
    ///
    /// Performs no I/O when nothing is connected. A failed send leaves the
    /// connection in place.
    #[instrument(
        skip(self, message),
        fields(server_id = field::Empty, session_id = field::Empty, len = message.len())
    )]
    pub async fn send_to_active(&self, message: &str) -> Result<(), ConnectionError> {
        let mut active = self.active.lock().await;
        let Some(connection) = active.as_mut() else {
            return Err(ConnectionError::NoActiveConnection);
        };

        let span = Span::current();
        span.record("server_id", field::display(&connection.descriptor.id));
        span.record("session_id", field::display(connection.session));

        match connection.client.send(message).await {
            Ok(content) => {
                let delivered = self.dispatcher.deliver(Reply::now(content));
                info!(delivered, "Reply received");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Send failed");
                Err(ConnectionError::SendFailed {
                    message: e.message().to_string(),
                })
            }
        }
    }

    /// Tears down the current connection, if any. Always succeeds.
    pub async fn disconnect_active(&self) {
        let mut active = self.active.lock().await;
        if let Some(mut connection) = active.take() {
            connection.client.disconnect().await;
            info!(
                server_id = %connection.descriptor.id,
                session_id = %connection.session,
                "Disconnected"
            );
        }
    }

    /// Returns the id of the connected endpoint, if any.
    pub async fn active_server(&self) -> Option<ServerId> {
        self.active
            .lock()
            .await
            .as_ref()
            .map(|c| c.descriptor.id.clone())
    }
}
