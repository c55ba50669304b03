use super::*;

use std::time::Duration;

use axum::{
    extract::{
        ws::{Message as ServerMessage, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
    routing::get,
    Router,
};
use tokio::net::TcpListener;

use crate::store::StoreChange;

#[derive(Clone)]
struct PushScript {
    frames: Vec<String>,
}

async fn scripted_ws(ws: WebSocketUpgrade, State(script): State<PushScript>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| play_script(socket, script.frames))
}

async fn play_script(mut socket: WebSocket, frames: Vec<String>) {
    for frame in frames {
        if socket.send(ServerMessage::Text(frame)).await.is_err() {
            return;
        }
    }
    let _ = socket.close().await;
}

async fn spawn_push_server(frames: Vec<String>) -> String {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let app = Router::new()
        .route("/ws", get(scripted_ws))
        .with_state(PushScript { frames });
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}")
}

#[tokio::test]
async fn event_stream_folds_frames_and_lowers_the_flag_at_the_end() {
    let server_url = spawn_push_server(vec![
        serde_json::to_string(&ControlEvent::counter("pressCount", 1)).expect("json"),
        "not an envelope".to_string(),
        serde_json::to_string(&ControlEvent::dial_delta("zoom", -1)).expect("json"),
    ])
    .await;

    let store = EventStore::new();
    let mut changes = store.subscribe_changes();
    let stream = spawn_event_stream(store.clone(), &server_url)
        .await
        .expect("connect");

    tokio::time::timeout(Duration::from_secs(5), stream)
        .await
        .expect("stream should end")
        .expect("stream task");

    let history = store.events().await;
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].envelope.delta, Some(-1));
    assert_eq!(history[1].envelope.count, Some(1));
    assert!(!store.connected().await);

    let mut saw_disconnect = false;
    while let Ok(change) = changes.try_recv() {
        if change == StoreChange::Connection(false) {
            saw_disconnect = true;
        }
    }
    assert!(saw_disconnect);
}

#[tokio::test]
async fn connecting_to_a_dead_server_fails() {
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let store = EventStore::new();
    let result = spawn_event_stream(store, &format!("http://{addr}")).await;
    assert!(result.is_err());
}

#[test]
fn websocket_url_maps_http_schemes() {
    assert_eq!(
        websocket_url("http://127.0.0.1:3001").expect("url"),
        "ws://127.0.0.1:3001/ws"
    );
    assert_eq!(
        websocket_url("https://relay.example/").expect("url"),
        "wss://relay.example/ws"
    );
    assert!(websocket_url("ftp://relay.example").is_err());
}
