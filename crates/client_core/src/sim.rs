use std::{sync::Arc, time::Duration};

use rand::Rng;
use shared::protocol::ControlEvent;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::store::EventStore;

/// Cadence of fabricated events.
pub const SYNTHETIC_EVENT_PERIOD: Duration = Duration::from_secs(8);
const FADER_CHANNELS: u32 = 4;

/// Feeds the store a fabricated fader move every period while it reports
/// being connected, so the fold can be exercised without a relay or real
/// hardware. Opt-in only: abort the handle, or never spawn it, and the
/// store sees nothing.
pub fn spawn_synthetic_producer(store: Arc<EventStore>) -> JoinHandle<()> {
    let mut ticker = tokio::time::interval_at(
        tokio::time::Instant::now() + SYNTHETIC_EVENT_PERIOD,
        SYNTHETIC_EVENT_PERIOD,
    );
    tokio::spawn(async move {
        loop {
            ticker.tick().await;
            if !store.connected().await {
                continue;
            }
            let event = synthetic_fader_event();
            debug!(value = event.value, "injecting synthetic event");
            store.push_event(event).await;
        }
    })
}

fn synthetic_fader_event() -> ControlEvent {
    let mut rng = rand::thread_rng();
    let channel = rng.gen_range(1..=FADER_CHANNELS);
    let value = (rng.gen_range(0.0..100.0_f64) * 10.0).round() / 10.0;
    ControlEvent::dial_value("fader", value).with_label(format!("Fader {channel}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreChange;

    #[test]
    fn synthetic_events_look_like_fader_moves() {
        for _ in 0..32 {
            let event = synthetic_fader_event();
            assert_eq!(event.kind, "fader");

            let value = event.value.expect("value");
            assert!((0.0..=100.0).contains(&value));
            assert_eq!((value * 10.0).round() / 10.0, value);

            let label = event.label.expect("label");
            let channel: u32 = label
                .strip_prefix("Fader ")
                .expect("label prefix")
                .parse()
                .expect("channel");
            assert!((1..=FADER_CHANNELS).contains(&channel));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn injection_follows_the_period_and_the_connected_flag() {
        let store = EventStore::new();
        let mut rx = store.subscribe_changes();
        let producer = spawn_synthetic_producer(store.clone());

        // nothing fires before the first full period
        tokio::time::advance(SYNTHETIC_EVENT_PERIOD - Duration::from_millis(1)).await;
        assert!(rx.try_recv().is_err());

        tokio::time::advance(Duration::from_millis(1)).await;
        let change = rx.recv().await.expect("change");
        assert!(matches!(change, StoreChange::Event(event) if event.envelope.kind == "fader"));

        // suppressed while the store reports a lost connection
        store.set_connected(false).await;
        assert_eq!(rx.recv().await.expect("change"), StoreChange::Connection(false));
        tokio::time::advance(SYNTHETIC_EVENT_PERIOD * 3).await;
        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        while let Ok(change) = rx.try_recv() {
            assert!(!matches!(change, StoreChange::Event(_)));
        }

        // resumes on the tick after reconnecting
        store.set_connected(true).await;
        assert_eq!(rx.recv().await.expect("change"), StoreChange::Connection(true));
        tokio::time::advance(SYNTHETIC_EVENT_PERIOD).await;
        let change = rx.recv().await.expect("change");
        assert!(matches!(change, StoreChange::Event(event) if event.envelope.kind == "fader"));

        assert_eq!(store.events().await.len(), 2);
        producer.abort();
    }
}
