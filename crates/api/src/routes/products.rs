//! Route registrar for the `/products` scope.

use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::auth::Authenticator;
use crate::handlers::products::{self, ProductController};

/// Mount the product routes on `api` under `/products`, all behind
/// [`require_auth`](crate::middleware::auth::require_auth).
///
/// ```text
/// GET  /products/{barcode}                            -> get_product_details_by_barcode
/// GET  /products/{barcode}/nutrition                  -> get_nutrition_analysis
/// POST /products/{barcode}/nutrition/personalized     -> analyze_nutrition_with_preferences
/// ```
///
/// The authenticator and controller are owned by the mounted scope, so two
/// registrations on different routers share nothing.
pub fn setup_product_routes<S>(
    api: Router<S>,
    authenticator: Arc<dyn Authenticator>,
    controller: ProductController,
) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    let protected = Router::new()
        .route("/{barcode}", get(products::get_product_details_by_barcode))
        .route("/{barcode}/nutrition", get(products::get_nutrition_analysis))
        .route(
            "/{barcode}/nutrition/personalized",
            post(products::analyze_nutrition_with_preferences),
        )
        .route_layer(middleware::from_fn_with_state(
            authenticator,
            crate::middleware::auth::require_auth,
        ))
        .with_state(controller);

    api.nest("/products", protected)
}
