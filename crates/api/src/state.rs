use std::sync::Arc;

use crate::auth::Authenticator;
use crate::config::ServerConfig;
use crate::handlers::products::ProductController;
use crate::ws::WsManager;

/// Shared application state available to root-level handlers via
/// `State<AppState>`.
///
/// Cheaply cloneable (inner data is behind `Arc` or is already `Clone`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// Token verification used by the auth middleware and the WebSocket.
    pub authenticator: Arc<dyn Authenticator>,
    /// Product controller (catalog + analyzer).
    pub products: ProductController,
    /// WebSocket connection manager (browser clients).
    pub ws_manager: Arc<WsManager>,
}
