pub mod health;
pub mod products;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::ws;

/// Build the `/api/v1` route tree.
///
/// ```text
/// /products/{barcode}                              product details (auth)
/// /products/{barcode}/nutrition                    nutrition analysis (auth)
/// /products/{barcode}/nutrition/personalized       personalized analysis (auth, POST)
/// ```
pub fn api_routes(state: &AppState) -> Router<AppState> {
    products::setup_product_routes(
        Router::new(),
        Arc::clone(&state.authenticator),
        state.products.clone(),
    )
}

/// Root-level WebSocket routes.
///
/// ```text
/// /ws/nutrition/stream?token=<jwt>                 streaming nutrition analysis
/// ```
pub fn ws_routes() -> Router<AppState> {
    Router::new().route("/ws/nutrition/stream", get(ws::nutrition_stream_handler))
}
