//! Rotation event stream
//!
//! Forwards every `RotationEvent` the engine emits as a JSON text frame.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

use super::WS_BUFFER_SIZE;
use crate::api::server::AppState;
use crate::models::RotationEvent;

pub async fn events_ws(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| serve_events(socket, state))
}

/// One connection: engine events -> bounded buffer -> socket. When any leg
/// finishes the other two are aborted.
async fn serve_events(socket: WebSocket, state: AppState) {
    let (sink, stream) = socket.split();
    let (tx, rx) = mpsc::channel::<RotationEvent>(WS_BUFFER_SIZE);

    info!("Events WebSocket connected");

    let mut forward = tokio::spawn(forward_events(state.engine.subscribe(), tx));
    let mut writer = tokio::spawn(write_frames(sink, rx));
    let mut reader = tokio::spawn(watch_for_close(stream));

    tokio::select! {
        _ = &mut forward => debug!("Event forwarding ended"),
        _ = &mut writer => debug!("Frame writer ended"),
        _ = &mut reader => debug!("Client side closed"),
    }
    forward.abort();
    writer.abort();
    reader.abort();

    info!("Events WebSocket disconnected");
}

/// Copy engine events into the connection buffer until either side closes
///
/// A full buffer drops the event; a closed buffer ends the task.
pub(crate) async fn forward_events(
    mut events: broadcast::Receiver<RotationEvent>,
    tx: mpsc::Sender<RotationEvent>,
) {
    loop {
        match events.recv().await {
            Ok(event) => match tx.try_send(event) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    debug!("Events WebSocket buffer full, dropping event");
                }
                Err(TrySendError::Closed(_)) => break,
            },
            Err(RecvError::Lagged(n)) => {
                warn!("Events WebSocket lagged, missed {} events", n);
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn write_frames(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::Receiver<RotationEvent>,
) {
    while let Some(event) = rx.recv().await {
        let json = match serde_json::to_string(&event) {
            Ok(json) => json,
            Err(e) => {
                error!("Failed to serialize rotation event: {}", e);
                continue;
            }
        };
        if sink.send(Message::Text(json)).await.is_err() {
            break;
        }
    }
}

// Incoming frames only matter for close detection
async fn watch_for_close(mut stream: SplitStream<WebSocket>) {
    while let Some(msg) = stream.next().await {
        match msg {
            Ok(Message::Close(_)) => break,
            Err(e) => {
                debug!("Events WebSocket error: {}", e);
                break;
            }
            _ => {}
        }
    }
}
