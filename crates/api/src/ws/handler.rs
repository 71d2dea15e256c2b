use amobagan_core::error::CoreError;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::state::AppState;
use crate::ws::session::StreamSession;

/// Browsers cannot set headers on WebSocket requests, so the access token
/// travels in the query string.
#[derive(Debug, Deserialize)]
pub struct StreamAuthQuery {
    token: Option<String>,
}

/// GET /ws/nutrition/stream?token=<jwt>
///
/// Authenticates the token, then upgrades. Unauthenticated requests get a
/// 401 and are never upgraded.
pub async fn nutrition_stream_handler(
    State(state): State<AppState>,
    Query(query): Query<StreamAuthQuery>,
    ws: WebSocketUpgrade,
) -> AppResult<impl IntoResponse> {
    let token = query
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Unauthorized("Missing token".into())))?;

    let user = state.authenticator.authenticate(token.trim())?;

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user)))
}

/// Manage a single WebSocket connection after upgrade.
///
/// Splits the socket into a sink (outbound) and stream (inbound), then:
///   1. Registers the connection with `WsManager`.
///   2. Spawns a sender task that forwards messages from the manager channel.
///   3. Feeds inbound text frames to the connection's [`StreamSession`].
///   4. Cleans up on disconnect.
async fn handle_socket(socket: WebSocket, state: AppState, user: AuthUser) {
    let conn_id = uuid::Uuid::new_v4().to_string();
    let ws_manager = state.ws_manager;

    let (sender, mut rx) = ws_manager.add(conn_id.clone(), user.user_id).await;
    let open_for_user = ws_manager.user_connection_count(user.user_id).await;
    tracing::info!(conn_id = %conn_id, user_id = user.user_id, open_for_user, "Nutrition stream connected");

    let (mut sink, mut stream) = socket.split();

    // Sender task: forward channel messages to the WebSocket sink.
    let sender_conn_id = conn_id.clone();
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let closing = matches!(msg, Message::Close(_));
            if sink.send(msg).await.is_err() {
                tracing::debug!(conn_id = %sender_conn_id, "WebSocket sink closed");
                break;
            }
            if closing {
                break;
            }
        }
    });

    let mut session = StreamSession::new(conn_id.clone(), state.products, sender);

    while let Some(result) = stream.next().await {
        match result {
            Ok(Message::Text(text)) => session.handle_text(text.as_str()),
            Ok(Message::Close(_)) => break,
            Ok(Message::Pong(_)) => {
                tracing::trace!(conn_id = %conn_id, "Pong received");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!(conn_id = %conn_id, error = %e, "WebSocket receive error");
                break;
            }
        }
    }

    if session.is_streaming() {
        tracing::debug!(conn_id = %conn_id, "Client left mid-analysis");
    }
    drop(session);

    let open_for = ws_manager.remove(&conn_id).await;
    send_task.abort();
    tracing::info!(
        conn_id = %conn_id,
        open_secs = open_for.map(|d| d.num_seconds()).unwrap_or_default(),
        "Nutrition stream disconnected"
    );
}
