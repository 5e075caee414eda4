//! Push delivery of replies to the UI subscriber.
//!
//! There is at most one subscriber. Delivery never blocks and never retries:
//! a reply is dropped when nobody is subscribed, when the subscriber has gone
//! away, or when its bounded buffer is full.

use std::sync::{Mutex, MutexGuard, PoisonError};

use domain::Reply;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Buffer size used when the caller has no preference.
pub const DEFAULT_REPLY_BUFFER: usize = 32;

/// Fans replies out to the single registered subscriber.
#[derive(Debug, Default)]
pub struct ReplyDispatcher {
    subscriber: Mutex<Option<mpsc::Sender<Reply>>>,
}

impl ReplyDispatcher {
    /// Creates a dispatcher with no subscriber.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the subscriber, replacing any previous one.
    ///
    /// The returned receiver buffers up to `capacity` undelivered replies
    /// (at least one). A replaced subscriber's receiver sees end-of-stream.
    pub fn subscribe(&self, capacity: usize) -> mpsc::Receiver<Reply> {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        if self.slot().replace(tx).is_some() {
            debug!("Reply subscriber replaced");
        }
        rx
    }

    /// Removes the current subscriber, if any.
    pub fn unsubscribe(&self) {
        self.slot().take();
    }

    /// Returns `true` if a live subscriber is registered.
    pub fn has_subscriber(&self) -> bool {
        self.slot().as_ref().is_some_and(|tx| !tx.is_closed())
    }

    /// Pushes `reply` to the subscriber. Returns `false` if it was dropped.
    pub fn deliver(&self, reply: Reply) -> bool {
        let mut slot = self.slot();
        let Some(tx) = slot.as_ref() else {
            debug!("No reply subscriber; reply dropped");
            return false;
        };

        match tx.try_send(reply) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(capacity = tx.max_capacity(), "Reply subscriber is full; reply dropped");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!("Reply subscriber went away; reply dropped");
                *slot = None;
                false
            }
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<mpsc::Sender<Reply>>> {
        self.subscriber.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
