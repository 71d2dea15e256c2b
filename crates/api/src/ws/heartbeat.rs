use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use crate::ws::manager::WsManager;

/// Default ping period for streaming connections.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

/// Ping every open stream connection each `period` so idle sockets survive
/// proxies while a client is reading a long analysis.
///
/// The first ping goes out one full period after start. Abort the returned
/// handle to stop it.
pub fn start_heartbeat(ws_manager: Arc<WsManager>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let start = tokio::time::Instant::now() + period;
        let mut ticker = tokio::time::interval_at(start, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let open = ws_manager.connection_count().await;
            if open == 0 {
                continue;
            }
            tracing::trace!(open, "Pinging stream connections");
            ws_manager.ping_all().await;
        }
    })
}
