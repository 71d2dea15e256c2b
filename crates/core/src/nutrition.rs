//! Nutrition analysis results and the personalization request body.

use serde::{Deserialize, Serialize};

use crate::barcode::Barcode;
use crate::types::Timestamp;

/// Dietary context submitted with a personalized analysis request.
///
/// Unknown fields are ignored so older clients keep working when the form
/// grows. No field is required; an empty object is a valid request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionPreferences {
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A finished nutrition analysis for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionAnalysis {
    pub barcode: Barcode,
    pub product_name: String,
    /// Formatted analysis text (markdown or HTML, as produced upstream).
    pub content: String,
    /// Whether preferences were taken into account.
    pub personalized: bool,
    pub generated_at: Timestamp,
}

/// One increment of a streamed analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisChunk {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_is_a_valid_preferences_body() {
        let prefs: NutritionPreferences = serde_json::from_str("{}").unwrap();
        assert_eq!(prefs, NutritionPreferences::default());
    }

    #[test]
    fn unknown_preference_fields_are_ignored() {
        let prefs: NutritionPreferences = serde_json::from_value(serde_json::json!({
            "allergies": ["peanuts"],
            "favourite_colour": "green",
        }))
        .unwrap();

        assert_eq!(prefs.allergies, vec!["peanuts".to_string()]);
    }
}
