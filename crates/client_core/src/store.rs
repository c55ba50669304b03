use std::{collections::VecDeque, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use shared::protocol::ControlEvent;
use tokio::{
    sync::{broadcast, Mutex},
    task::JoinHandle,
};
use tracing::debug;

/// How many events the history keeps. Older entries fall off the tail.
pub const HISTORY_LIMIT: usize = 20;
/// How long the newest event stays highlighted before it expires.
pub const ACTIVE_EVENT_TTL: Duration = Duration::from_secs(3);
const CHANGE_CHANNEL_CAPACITY: usize = 256;

/// Monotonic per-store sequence number. Newer events always compare greater.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(pub u64);

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One received envelope plus the metadata the store stamps onto it.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredEvent {
    pub id: EventId,
    pub received_at: DateTime<Utc>,
    pub envelope: ControlEvent,
}

impl StoredEvent {
    /// Human label for list rows: the producer's own label when the envelope
    /// carries one, otherwise the event type with its payload.
    pub fn display_label(&self) -> String {
        if let Some(label) = &self.envelope.label {
            return label.clone();
        }
        let kind = &self.envelope.kind;
        if let Some(count) = self.envelope.count {
            format!("{kind} {count}")
        } else if let Some(delta) = self.envelope.delta {
            format!("{kind} {delta:+}")
        } else if let Some(value) = self.envelope.value {
            format!("{kind} {value:.1}")
        } else {
            kind.clone()
        }
    }
}

/// What subscribers are told about. Every mutation of the store maps to
/// exactly one of these.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreChange {
    /// A new event entered the history and became the active one.
    Event(StoredEvent),
    /// The active highlight expired without being superseded.
    ActiveCleared,
    /// The connection flag flipped to the carried value.
    Connection(bool),
}

struct StoreState {
    connected: bool,
    history: VecDeque<StoredEvent>,
    active: Option<StoredEvent>,
    next_id: u64,
    active_epoch: u64,
    expiry_task: Option<JoinHandle<()>>,
}

/// Client-side fold over the pushed event stream. Keeps a bounded
/// newest-first history, tracks which event is currently active, and owns
/// the connection flag. All mutation goes through the methods here so the
/// change channel stays consistent with the state.
pub struct EventStore {
    inner: Mutex<StoreState>,
    changes: broadcast::Sender<StoreChange>,
}

impl EventStore {
    pub fn new() -> Arc<Self> {
        let (changes, _) = broadcast::channel(CHANGE_CHANNEL_CAPACITY);
        Arc::new(Self {
            inner: Mutex::new(StoreState {
                connected: true,
                history: VecDeque::new(),
                active: None,
                next_id: 0,
                active_epoch: 0,
                expiry_task: None,
            }),
            changes,
        })
    }

    /// Folds one envelope into the store: prepend to the history, trim the
    /// tail, make it the active event and restart the expiry timer. The
    /// epoch bump plus abort guarantees a superseded timer can never clear
    /// the replacement event.
    pub async fn push_event(self: &Arc<Self>, envelope: ControlEvent) -> StoredEvent {
        let mut state = self.inner.lock().await;
        state.next_id += 1;
        let event = StoredEvent {
            id: EventId(state.next_id),
            received_at: Utc::now(),
            envelope,
        };
        state.history.push_front(event.clone());
        state.history.truncate(HISTORY_LIMIT);
        state.active = Some(event.clone());
        state.active_epoch += 1;
        let epoch = state.active_epoch;
        if let Some(stale) = state.expiry_task.take() {
            stale.abort();
        }
        let deadline = tokio::time::Instant::now() + ACTIVE_EVENT_TTL;
        let store = self.clone();
        state.expiry_task = Some(tokio::spawn(async move {
            tokio::time::sleep_until(deadline).await;
            store.clear_active(epoch).await;
        }));
        drop(state);
        let _ = self.changes.send(StoreChange::Event(event.clone()));
        event
    }

    async fn clear_active(&self, epoch: u64) {
        let mut state = self.inner.lock().await;
        if state.active_epoch != epoch {
            return;
        }
        if state.active.take().is_none() {
            return;
        }
        state.expiry_task = None;
        drop(state);
        debug!("active event expired");
        let _ = self.changes.send(StoreChange::ActiveCleared);
    }

    /// Flips the connection flag. Calls that repeat the current value are
    /// ignored, so subscribers only hear about real transitions.
    pub async fn set_connected(&self, connected: bool) {
        let mut state = self.inner.lock().await;
        if state.connected == connected {
            return;
        }
        state.connected = connected;
        drop(state);
        debug!(connected, "connection flag changed");
        let _ = self.changes.send(StoreChange::Connection(connected));
    }

    pub async fn connected(&self) -> bool {
        self.inner.lock().await.connected
    }

    /// Snapshot of the history, newest first.
    pub async fn events(&self) -> Vec<StoredEvent> {
        self.inner.lock().await.history.iter().cloned().collect()
    }

    pub async fn last_event(&self) -> Option<StoredEvent> {
        self.inner.lock().await.history.front().cloned()
    }

    pub async fn active_event(&self) -> Option<StoredEvent> {
        self.inner.lock().await.active.clone()
    }

    pub fn subscribe_changes(&self) -> broadcast::Receiver<StoreChange> {
        self.changes.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
