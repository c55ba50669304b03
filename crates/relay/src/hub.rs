use std::{
    collections::HashMap,
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

use shared::protocol::ControlEvent;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, warn};

/// Serialized envelopes a subscriber may fall behind by before it counts as
/// stalled and is dropped.
pub const SUBSCRIBER_QUEUE_DEPTH: usize = 64;

/// Handle for one registered subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Owns the live subscriber set. Accepted envelopes are serialized once and
/// offered to every subscriber's queue; a subscriber whose queue is closed or
/// full is unregistered instead of retried. Nothing outside this type ever
/// touches the set.
pub struct Broadcaster {
    next_id: AtomicU64,
    subscribers: Mutex<HashMap<SubscriberId, mpsc::Sender<String>>>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            subscribers: Mutex::new(HashMap::new()),
        }
    }

    /// Adds a subscriber and hands back its event queue. Joining carries no
    /// backlog: the queue only sees envelopes accepted after this call.
    pub async fn register(&self) -> (SubscriberId, mpsc::Receiver<String>) {
        let id = SubscriberId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(SUBSCRIBER_QUEUE_DEPTH);
        self.subscribers.lock().await.insert(id, tx);
        debug!(subscriber = %id, "subscriber registered");
        (id, rx)
    }

    /// Drops a subscriber from the set. Safe to call while a broadcast is in
    /// flight and safe to call twice.
    pub async fn unregister(&self, id: SubscriberId) {
        if self.subscribers.lock().await.remove(&id).is_some() {
            debug!(subscriber = %id, "subscriber unregistered");
        }
    }

    /// Delivers `envelope` to every registered subscriber and reports how
    /// many queues accepted it. One non-blocking attempt per subscriber, so a
    /// dead or stalled connection never delays the others.
    pub async fn broadcast(&self, envelope: &ControlEvent) -> usize {
        let text = match serde_json::to_string(envelope) {
            Ok(text) => text,
            Err(error) => {
                warn!(%error, "dropping envelope that cannot be serialized");
                return 0;
            }
        };

        let mut subscribers = self.subscribers.lock().await;
        let mut delivered = 0;
        let mut dropped = Vec::new();
        for (id, tx) in subscribers.iter() {
            match tx.try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(subscriber = %id, "subscriber queue full, dropping subscriber");
                    dropped.push(*id);
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    warn!(subscriber = %id, "subscriber queue closed, dropping subscriber");
                    dropped.push(*id);
                }
            }
        }
        for id in dropped {
            subscribers.remove(&id);
        }
        delivered
    }

    pub async fn subscriber_count(&self) -> usize {
        self.subscribers.lock().await.len()
    }
}

#[cfg(test)]
#[path = "tests/hub_tests.rs"]
mod tests;
