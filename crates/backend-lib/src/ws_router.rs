// ============================
// crates/backend-lib/src/ws_router.rs
// ============================
//! Realtime channel: token-gated WebSocket upgrade feeding the fan-out.
use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::IntoResponse,
};
use futures_util::{SinkExt, StreamExt};
use matchday_common::UserId;
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{metrics, AppState};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    pub token: Option<String>,
}

/// Handler for WebSocket connections
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsParams>,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let user_id = match params.token.as_deref() {
        Some(token) => state.auth.authenticate(token).await,
        None => None,
    };

    match user_id {
        Some(user_id) => {
            ::metrics::counter!(metrics::WS_CONNECTION).increment(1);
            ws.on_upgrade(move |socket| handle_connection(socket, state, user_id))
        },
        None => {
            ::metrics::counter!(metrics::WS_REJECTED).increment(1);
            tracing::info!("realtime connection rejected: missing or invalid token");
            ws.on_upgrade(reject)
        },
    }
}

/// Close straight away; the client is expected not to retry
async fn reject(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: "invalid or missing token".into(),
    };
    let _ = socket.send(Message::Close(Some(frame))).await;
}

async fn handle_connection(socket: WebSocket, state: Arc<AppState>, user_id: UserId) {
    let (mut sink, mut stream) = socket.split();
    let (tx, mut rx) = mpsc::channel(state.settings.realtime.channel_capacity);
    let connection_id = state.registry.register(user_id, tx);
    tracing::info!(%user_id, connection_id, "realtime connection opened");

    // Forward fan-out frames to the socket
    let mut send_task = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    // Clients have nothing to say; drain until they hang up
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            if matches!(message, Message::Close(_)) {
                break;
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.registry.unregister(user_id, connection_id);
    tracing::info!(%user_id, connection_id, "realtime connection closed");
}
