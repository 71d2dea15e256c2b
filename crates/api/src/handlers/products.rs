//! Product controller.
//!
//! Looks products up by barcode and asks the analyzer for nutrition
//! analyses. All three handlers sit behind
//! [`require_auth`](crate::middleware::auth::require_auth), which runs first.

use std::sync::Arc;

use amobagan_core::analysis::{AnalysisStream, NutritionAnalyzer};
use amobagan_core::barcode::Barcode;
use amobagan_core::catalog::ProductCatalog;
use amobagan_core::error::CoreError;
use amobagan_core::nutrition::{NutritionAnalysis, NutritionPreferences};
use amobagan_core::product::Product;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;

/// Holds the collaborators the product endpoints delegate to.
///
/// Cheap to clone; used directly as the router state of the `/products`
/// scope.
#[derive(Clone)]
pub struct ProductController {
    catalog: Arc<dyn ProductCatalog>,
    analyzer: Arc<dyn NutritionAnalyzer>,
}

impl ProductController {
    pub fn new(catalog: Arc<dyn ProductCatalog>, analyzer: Arc<dyn NutritionAnalyzer>) -> Self {
        Self { catalog, analyzer }
    }

    /// Look up a product, turning "unknown barcode" into `NotFound`.
    pub async fn product(&self, barcode: &Barcode) -> Result<Product, CoreError> {
        self.catalog
            .find_by_barcode(barcode)
            .await?
            .ok_or_else(|| CoreError::NotFound {
                entity: "Product",
                id: barcode.to_string(),
            })
    }

    pub async fn analysis(
        &self,
        barcode: &Barcode,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, CoreError> {
        let product = self.product(barcode).await?;
        self.analyzer.analyze(&product, preferences).await
    }

    pub async fn analysis_stream(
        &self,
        barcode: &Barcode,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<(Product, AnalysisStream), CoreError> {
        let product = self.product(barcode).await?;
        let stream = self.analyzer.analyze_stream(&product, preferences).await?;
        Ok((product, stream))
    }
}

/// GET /api/v1/products/{barcode}
pub async fn get_product_details_by_barcode(
    auth: AuthUser,
    State(controller): State<ProductController>,
    Path(barcode): Path<String>,
) -> AppResult<DataResponse<Product>> {
    let barcode = Barcode::new(barcode);
    tracing::debug!(%barcode, user_id = auth.user_id, "Product lookup");

    let product = controller.product(&barcode).await?;

    Ok(DataResponse::new(product))
}

/// GET /api/v1/products/{barcode}/nutrition
pub async fn get_nutrition_analysis(
    auth: AuthUser,
    State(controller): State<ProductController>,
    Path(barcode): Path<String>,
) -> AppResult<DataResponse<NutritionAnalysis>> {
    let barcode = Barcode::new(barcode);
    tracing::debug!(%barcode, user_id = auth.user_id, "Nutrition analysis requested");

    let analysis = controller.analysis(&barcode, None).await?;

    Ok(DataResponse::new(analysis))
}

/// POST /api/v1/products/{barcode}/nutrition/personalized
///
/// The body is deserialized into [`NutritionPreferences`] and passed through
/// to the analyzer unchanged.
pub async fn analyze_nutrition_with_preferences(
    auth: AuthUser,
    State(controller): State<ProductController>,
    Path(barcode): Path<String>,
    payload: Result<Json<NutritionPreferences>, JsonRejection>,
) -> AppResult<DataResponse<NutritionAnalysis>> {
    let Json(preferences) = payload?;
    let barcode = Barcode::new(barcode);
    tracing::info!(%barcode, user_id = auth.user_id, "Personalized analysis requested");

    let analysis = controller.analysis(&barcode, Some(&preferences)).await?;

    Ok(DataResponse::new(analysis))
}
