//! Registry of open nutrition-stream connections.

use std::collections::HashMap;

use amobagan_core::types::{DbId, Timestamp};
use axum::body::Bytes;
use axum::extract::ws::Message;
use tokio::sync::{mpsc, RwLock};

/// Outbound queue of one connection.
pub type WsSender = mpsc::UnboundedSender<Message>;

pub struct WsConnection {
    pub user_id: DbId,
    pub sender: WsSender,
    pub connected_at: Timestamp,
}

/// All open stream connections, keyed by connection id.
///
/// Shared as `Arc<WsManager>` between the upgrade handler, the heartbeat
/// task and shutdown.
#[derive(Default)]
pub struct WsManager {
    connections: RwLock<HashMap<String, WsConnection>>,
}

impl WsManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `conn_id` for `user_id`, replacing any connection already
    /// registered under that id.
    ///
    /// The caller keeps the receiver and pumps it into the socket; the
    /// sender goes to whoever produces messages for the connection.
    pub async fn add(
        &self,
        conn_id: String,
        user_id: DbId,
    ) -> (WsSender, mpsc::UnboundedReceiver<Message>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let conn = WsConnection {
            user_id,
            sender: tx.clone(),
            connected_at: chrono::Utc::now(),
        };
        self.connections.write().await.insert(conn_id, conn);
        (tx, rx)
    }

    /// Forget a connection. Returns how long it was open, or `None` if the
    /// id was unknown (e.g. already cleared by [`shutdown_all`](Self::shutdown_all)).
    pub async fn remove(&self, conn_id: &str) -> Option<chrono::Duration> {
        let conn = self.connections.write().await.remove(conn_id)?;
        Some(chrono::Utc::now() - conn.connected_at)
    }

    pub async fn user_connection_count(&self, user_id: DbId) -> usize {
        self.connections
            .read()
            .await
            .values()
            .filter(|conn| conn.user_id == user_id)
            .count()
    }

    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Queue a Close frame on every connection and empty the registry.
    pub async fn shutdown_all(&self) {
        let mut conns = self.connections.write().await;
        let count = conns.len();
        for (_, conn) in conns.drain() {
            let _ = conn.sender.send(Message::Close(None));
        }
        tracing::info!(count, "Closed all stream connections");
    }

    /// Queue a Ping on every connection. Closed queues are skipped.
    pub async fn ping_all(&self) {
        for conn in self.connections.read().await.values() {
            let _ = conn.sender.send(Message::Ping(Bytes::new()));
        }
    }
}
