//! `GET /ws/{session_id}` (§6.2): upgrades to a server->client event
//! stream. Client->server frames are ignored (§6.2: "an informational
//! channel"). Shaped after the teacher's `nodes::ws::node_ws` split
//! between an upgrade handler and a `handle_socket` loop, simplified
//! since this socket is one-directional.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};

use crate::state::AppState;

pub async fn upgrade(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state, session_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, session_id: String) {
    let (mut sink, mut stream) = socket.split();
    let sub = state.bus.subscribe(&session_id);

    // Reader: drains and discards client frames, just to notice Close.
    let mut reader = tokio::spawn(async move {
        while let Some(Ok(msg)) = stream.next().await {
            if matches!(msg, Message::Close(_)) {
                break;
            }
        }
    });

    loop {
        tokio::select! {
            event = sub.recv() => {
                match event {
                    Some(event) => {
                        let payload = match serde_json::to_string(&event) {
                            Ok(p) => p,
                            Err(e) => {
                                tracing::warn!(session_id = %session_id, error = %e, "failed to serialize event");
                                continue;
                            }
                        };
                        if sink.send(Message::Text(payload)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
            _ = &mut reader => break,
        }
    }

    reader.abort();
}
