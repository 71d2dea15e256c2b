//! Nutrition analysis collaborator.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::CoreError;
use crate::nutrition::{AnalysisChunk, NutritionAnalysis, NutritionPreferences};
use crate::product::Product;

/// Stream of analysis increments; ends when the analysis is complete.
pub type AnalysisStream = BoxStream<'static, Result<AnalysisChunk, CoreError>>;

/// Produces nutrition analyses for products.
///
/// `preferences` is `None` for the generic analysis and `Some` for the
/// personalized one; implementations must not invent preferences.
#[async_trait]
pub trait NutritionAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<NutritionAnalysis, CoreError>;

    async fn analyze_stream(
        &self,
        product: &Product,
        preferences: Option<&NutritionPreferences>,
    ) -> Result<AnalysisStream, CoreError>;
}
