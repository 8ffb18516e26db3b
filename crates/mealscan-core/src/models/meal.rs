// ABOUTME: Meal classification and the final analysis result model
// ABOUTME: MealType, MealClassification invariant, DetectionRoute, MealAnalysisResult
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{DetectedFoodItem, FoodCategory, NutritionInfo, NutritionTier};

/// Whether a photo shows raw ingredients, a finished dish, or both
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum MealType {
    /// Raw or separate ingredients
    Ingredients,
    /// A prepared dish
    ReadyMade,
    /// Prepared food together with raw ingredients
    Mixed,
    /// Not classified
    #[default]
    Unknown,
}

impl MealType {
    /// Parse a meal type label, accepting common spelling variants
    ///
    /// Returns `None` for anything outside the four known values.
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "ingredients" | "ingredient" => Some(Self::Ingredients),
            "readymade" => Some(Self::ReadyMade),
            "mixed" => Some(Self::Mixed),
            "unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// Meal type together with the model's confidence and reasoning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealClassification {
    /// Classified meal type
    pub meal_type: MealType,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Free-text justification
    pub reason: Option<String>,
}

impl MealClassification {
    /// Build a classification
    ///
    /// A zero confidence with no reason carries no information, so it is
    /// coerced to `Unknown` whatever type was requested.
    #[must_use]
    pub fn new(meal_type: MealType, confidence: f64, reason: Option<String>) -> Self {
        let confidence = if confidence.is_finite() {
            confidence.clamp(0.0, 1.0)
        } else {
            0.0
        };
        let reason = reason.filter(|r| !r.trim().is_empty());
        let meal_type = if confidence <= 0.0 && reason.is_none() {
            MealType::Unknown
        } else {
            meal_type
        };
        Self {
            meal_type,
            confidence,
            reason,
        }
    }

    /// Unclassified meal
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            meal_type: MealType::Unknown,
            confidence: 0.0,
            reason: None,
        }
    }
}

impl Default for MealClassification {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Route the detection orchestrator took
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum DetectionRoute {
    /// Local classifier results were confident enough to use alone
    LocalTrusted,
    /// Local and remote results were merged
    Merged,
    /// Only the remote detector was available
    RemoteOnly,
    /// Remote detector absent or degraded, local results used
    LocalOnly,
    /// No detector produced usable output
    Fallback,
}

impl DetectionRoute {
    /// Name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LocalTrusted => "local_trusted",
            Self::Merged => "merged",
            Self::RemoteOnly => "remote_only",
            Self::LocalOnly => "local_only",
            Self::Fallback => "fallback",
        }
    }
}

/// Final, immutable output of one meal analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MealAnalysisResult {
    /// Detected items with resolved nutrition
    pub detected_foods: Vec<DetectedFoodItem>,
    /// Sum of all item nutrition
    pub total_nutrition: NutritionInfo,
    /// Mean item confidence in [0, 1]
    pub confidence_score: f64,
    /// Category with the highest confidence-weighted sum
    pub primary_food_category: FoodCategory,
    /// Triggered allergen categories
    pub allergen_warnings: BTreeSet<String>,
    /// Meal type
    pub meal_type: MealType,
    /// Meal type confidence
    pub meal_type_confidence: f64,
    /// Meal type justification
    pub meal_type_reason: Option<String>,
    /// When the analysis completed
    pub analysis_timestamp: DateTime<Utc>,
    /// Detection route taken
    pub detection_route: DetectionRoute,
    /// Resolver tier per item, parallel to `detected_foods`
    pub nutrition_sources: Vec<NutritionTier>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_confidence_without_reason_is_unknown() {
        let classification = MealClassification::new(MealType::ReadyMade, 0.0, None);
        assert_eq!(classification.meal_type, MealType::Unknown);

        let classification =
            MealClassification::new(MealType::ReadyMade, 0.0, Some("plated dish".into()));
        assert_eq!(classification.meal_type, MealType::ReadyMade);
    }

    #[test]
    fn test_meal_type_spellings() {
        assert_eq!(MealType::parse_label("ready_made"), Some(MealType::ReadyMade));
        assert_eq!(MealType::parse_label("readyMade"), Some(MealType::ReadyMade));
        assert_eq!(MealType::parse_label("Ready-Made"), Some(MealType::ReadyMade));
        assert_eq!(MealType::parse_label("snack"), None);
    }
}
