use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State, WebSocketUpgrade},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use shared::{
    error::{ApiError, ErrorCode},
    protocol::{ControlEvent, SubmitAck},
};
use tower_http::services::ServeDir;
use tracing::{info, warn};

mod config;
mod hub;

use config::{load_settings, prepare_static_dir};
use hub::Broadcaster;

#[derive(Clone)]
struct AppState {
    hub: Arc<Broadcaster>,
}

const MAX_ENVELOPE_BYTES: usize = 64 * 1024;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_env_filter("info").init();

    let settings = load_settings();
    let static_dir = prepare_static_dir(&settings.static_dir);

    let state = AppState {
        hub: Arc::new(Broadcaster::new()),
    };
    let app = build_router(Arc::new(state), static_dir.clone());

    let addr: SocketAddr = settings.bind_addr.parse()?;
    info!(%addr, static_dir = %static_dir.display(), "relay listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

fn build_router(state: Arc<AppState>, static_dir: PathBuf) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/control", post(submit_control))
        .route("/ws", get(ws_handler))
        .layer(DefaultBodyLimit::max(MAX_ENVELOPE_BYTES))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

async fn submit_control(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<SubmitAck>, (StatusCode, Json<ApiError>)> {
    let envelope: ControlEvent = serde_json::from_slice(&body).map_err(|error| {
        warn!(%error, "rejecting control submission that is not an event envelope");
        (
            StatusCode::BAD_REQUEST,
            Json(ApiError::new(
                ErrorCode::Validation,
                "body must be a control event object",
            )),
        )
    })?;

    let delivered = state.hub.broadcast(&envelope).await;
    info!(kind = %envelope.kind, delivered, "control event relayed");
    Ok(Json(SubmitAck::accepted()))
}

async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| ws_connection(state, socket))
}

async fn ws_connection(state: Arc<AppState>, socket: axum::extract::ws::WebSocket) {
    use axum::extract::ws::Message;
    use futures::{SinkExt, StreamExt};

    let (mut sender, mut receiver) = socket.split();
    let (subscriber_id, mut outbox) = state.hub.register().await;
    info!(subscriber = %subscriber_id, "subscriber connected");

    let send_task = tokio::spawn(async move {
        while let Some(text) = outbox.recv().await {
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Subscribers have nothing to say; drain frames until the peer goes away.
    while let Some(Ok(_msg)) = receiver.next().await {}

    send_task.abort();
    state.hub.unregister(subscriber_id).await;
    info!(subscriber = %subscriber_id, "subscriber disconnected");
}

#[cfg(test)]
#[path = "tests/main_tests.rs"]
mod tests;
