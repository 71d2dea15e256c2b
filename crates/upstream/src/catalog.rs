//! Barcode lookup against an Open Food Facts compatible API.
//!
//! Uses the v2 product endpoint, `GET /api/v2/product/{barcode}.json`,
//! restricted to the fields [`Product`] needs.

use amobagan_core::barcode::Barcode;
use amobagan_core::catalog::ProductCatalog;
use amobagan_core::error::CoreError;
use amobagan_core::product::{Nutriments, Product};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer};

use crate::error::{ensure_success, join_segments, UpstreamError};

/// Fields requested from the catalog. Keeps responses small; full product
/// documents run to hundreds of kilobytes.
const PRODUCT_FIELDS: &str = "code,product_name,generic_name,brands,quantity,categories,\
ingredients_text,allergens_tags,image_url,nutriscore_grade,nova_group,nutriments";

/// Name used when the catalog knows the barcode but not the product name.
const UNKNOWN_PRODUCT_NAME: &str = "Unknown product";

/// HTTP client for an Open Food Facts compatible product catalog.
pub struct OpenFoodFactsCatalog {
    client: reqwest::Client,
    base_url: String,
}

impl OpenFoodFactsCatalog {
    /// Create a catalog client.
    ///
    /// * `base_url` - e.g. `https://world.openfoodfacts.org`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    /// Create a catalog client reusing an existing [`reqwest::Client`]
    /// (shares its connection pool and default timeouts).
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }

    /// Fetch a product. `Ok(None)` when the catalog does not know the barcode.
    pub async fn fetch(&self, barcode: &Barcode) -> Result<Option<Product>, UpstreamError> {
        let file = format!("{barcode}.json");
        let url = join_segments(&self.base_url, &["api", "v2", "product", &file])?;

        let response = self
            .client
            .get(url)
            .query(&[("fields", PRODUCT_FIELDS)])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(%barcode, "Catalog returned 404");
            return Ok(None);
        }

        let response = ensure_success(response).await?;
        let bytes = response.bytes().await?;
        let envelope: OffEnvelope = serde_json::from_slice(&bytes)?;

        Ok(envelope.into_product(barcode))
    }
}

#[async_trait]
impl ProductCatalog for OpenFoodFactsCatalog {
    async fn find_by_barcode(&self, barcode: &Barcode) -> Result<Option<Product>, CoreError> {
        self.fetch(barcode).await.map_err(|e| {
            tracing::warn!(%barcode, error = %e, "Product catalog lookup failed");
            CoreError::from(e)
        })
    }
}

// ---------------------------------------------------------------------------
// Wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OffEnvelope {
    /// `1` when found, `0` otherwise.
    #[serde(default)]
    status: i64,
    product: Option<OffProduct>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OffProduct {
    product_name: Option<String>,
    generic_name: Option<String>,
    brands: Option<String>,
    quantity: Option<String>,
    categories: Option<String>,
    ingredients_text: Option<String>,
    allergens_tags: Vec<String>,
    image_url: Option<String>,
    nutriscore_grade: Option<String>,
    #[serde(deserialize_with = "lenient_u8")]
    nova_group: Option<u8>,
    nutriments: OffNutriments,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct OffNutriments {
    #[serde(rename = "energy-kcal_100g", deserialize_with = "lenient_f64")]
    energy_kcal: Option<f64>,
    #[serde(rename = "fat_100g", deserialize_with = "lenient_f64")]
    fat: Option<f64>,
    #[serde(rename = "saturated-fat_100g", deserialize_with = "lenient_f64")]
    saturated_fat: Option<f64>,
    #[serde(rename = "carbohydrates_100g", deserialize_with = "lenient_f64")]
    carbohydrates: Option<f64>,
    #[serde(rename = "sugars_100g", deserialize_with = "lenient_f64")]
    sugars: Option<f64>,
    #[serde(rename = "fiber_100g", deserialize_with = "lenient_f64")]
    fiber: Option<f64>,
    #[serde(rename = "proteins_100g", deserialize_with = "lenient_f64")]
    proteins: Option<f64>,
    #[serde(rename = "salt_100g", deserialize_with = "lenient_f64")]
    salt: Option<f64>,
    #[serde(rename = "sodium_100g", deserialize_with = "lenient_f64")]
    sodium: Option<f64>,
}

impl OffEnvelope {
    fn into_product(self, barcode: &Barcode) -> Option<Product> {
        if self.status != 1 {
            return None;
        }
        let p = self.product?;

        let name = non_empty(p.product_name)
            .or_else(|| non_empty(p.generic_name))
            .unwrap_or_else(|| UNKNOWN_PRODUCT_NAME.to_string());

        Some(Product {
            barcode: barcode.clone(),
            name,
            brand: non_empty(p.brands),
            quantity: non_empty(p.quantity),
            categories: split_list(p.categories.as_deref()),
            ingredients_text: non_empty(p.ingredients_text),
            allergens: p.allergens_tags.iter().map(|t| strip_lang(t)).collect(),
            image_url: non_empty(p.image_url),
            nutriscore_grade: non_empty(p.nutriscore_grade).map(|g| g.to_lowercase()),
            nova_group: p.nova_group,
            nutriments: Nutriments {
                energy_kcal: p.nutriments.energy_kcal,
                fat: p.nutriments.fat,
                saturated_fat: p.nutriments.saturated_fat,
                carbohydrates: p.nutriments.carbohydrates,
                sugars: p.nutriments.sugars,
                fiber: p.nutriments.fiber,
                proteins: p.nutriments.proteins,
                salt: p.nutriments.salt,
                sodium: p.nutriments.sodium,
            },
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// `"en:milk"` -> `"milk"`.
fn strip_lang(tag: &str) -> String {
    match tag.split_once(':') {
        Some((_, rest)) => rest.to_string(),
        None => tag.to_string(),
    }
}

/// Catalog data is crowd-sourced; numbers sometimes arrive as strings.
#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(f64),
    Text(String),
}

fn lenient_f64<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    let value = Option::<NumberOrString>::deserialize(deserializer)?;
    Ok(match value {
        Some(NumberOrString::Number(n)) => Some(n),
        Some(NumberOrString::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn lenient_u8<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u8>, D::Error> {
    Ok(lenient_f64(deserializer)?
        .filter(|n| n.fract() == 0.0 && (0.0..=f64::from(u8::MAX)).contains(n))
        .map(|n| n as u8))
}
