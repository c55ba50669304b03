use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use futures::StreamExt;
use shared::protocol::ControlEvent;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{info, warn};

use crate::store::EventStore;

pub(crate) fn websocket_url(server_url: &str) -> Result<String> {
    let base = if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(anyhow!("server_url must start with http:// or https://"));
    };
    Ok(format!("{}/ws", base.trim_end_matches('/')))
}

/// Connects to the relay's push stream and folds every frame into the store.
/// The returned handle runs until the relay closes the socket or the
/// connection drops; either way the store's connection flag is lowered on
/// the way out. Frames that do not parse as control events are logged and
/// skipped.
pub async fn spawn_event_stream(
    store: Arc<EventStore>,
    server_url: &str,
) -> Result<JoinHandle<()>> {
    let ws_url = websocket_url(server_url)?;
    let (ws_stream, _) = connect_async(&ws_url)
        .await
        .with_context(|| format!("failed to connect websocket: {ws_url}"))?;
    info!(url = %ws_url, "event stream connected");
    store.set_connected(true).await;

    let handle = tokio::spawn(async move {
        let (_, mut receiver) = ws_stream.split();
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => match serde_json::from_str::<ControlEvent>(&text) {
                    Ok(envelope) => {
                        store.push_event(envelope).await;
                    }
                    Err(error) => {
                        warn!(%error, "ignoring frame that is not a control event");
                    }
                },
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!(%error, "event stream failed");
                    break;
                }
            }
        }
        info!("event stream ended");
        store.set_connected(false).await;
    });
    Ok(handle)
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
