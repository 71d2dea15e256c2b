//! Product details as returned to API clients.

use serde::{Deserialize, Serialize};

use crate::barcode::Barcode;

/// A packaged food product identified by its barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub barcode: Barcode,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    /// Net quantity as printed on the pack, e.g. `"330 ml"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ingredients_text: Option<String>,
    #[serde(default)]
    pub allergens: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    /// Nutri-Score letter (`a` to `e`), lowercase.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nutriscore_grade: Option<String>,
    /// NOVA processing group (1 to 4).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nova_group: Option<u8>,
    #[serde(default)]
    pub nutriments: Nutriments,
}

/// Nutrient values per 100 g (or 100 ml for drinks).
///
/// Every field is optional: labels routinely omit some of them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Nutriments {
    pub energy_kcal: Option<f64>,
    pub fat: Option<f64>,
    pub saturated_fat: Option<f64>,
    pub carbohydrates: Option<f64>,
    pub sugars: Option<f64>,
    pub fiber: Option<f64>,
    pub proteins: Option<f64>,
    pub salt: Option<f64>,
    pub sodium: Option<f64>,
}

impl Product {
    /// A product with only the identifying fields set.
    pub fn new(barcode: impl Into<Barcode>, name: impl Into<String>) -> Self {
        Self {
            barcode: barcode.into(),
            name: name.into(),
            brand: None,
            quantity: None,
            categories: Vec::new(),
            ingredients_text: None,
            allergens: Vec::new(),
            image_url: None,
            nutriscore_grade: None,
            nova_group: None,
            nutriments: Nutriments::default(),
        }
    }
}
