// ABOUTME: Food item models produced by the detectors and carried into the final result
// ABOUTME: FoodCategory inference, preparation state, candidates, and detected items
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde::{Deserialize, Serialize};

use super::NutritionInfo;
use crate::constants::keywords::{
    CARBOHYDRATE_KEYWORDS, DAIRY_KEYWORDS, FAT_KEYWORDS, FRUIT_KEYWORDS, NON_DAIRY_PHRASES,
    PROTEIN_KEYWORDS, VEGETABLE_KEYWORDS,
};
use crate::text::NameTokens;

/// Broad food group of a detected item
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    /// Meat, fish, eggs, legumes
    Protein,
    /// Grains, bread, starches
    Carbohydrates,
    /// Vegetables and salads
    Vegetables,
    /// Fruit
    Fruits,
    /// Milk products
    Dairy,
    /// Oils, nuts, seeds
    Fats,
    /// Anything unclassified
    #[default]
    Other,
}

impl FoodCategory {
    /// Infer a category from a food name using the static keyword tables
    ///
    /// The first matching group wins, falling back to `Other`.
    #[must_use]
    pub fn infer_from_name(name: &str) -> Self {
        let tokens = NameTokens::new(name);
        let dairy_tokens = tokens.without(NON_DAIRY_PHRASES);
        let rules: [(&NameTokens, &[&str], Self); 6] = [
            (&tokens, PROTEIN_KEYWORDS, Self::Protein),
            (&dairy_tokens, DAIRY_KEYWORDS, Self::Dairy),
            (&tokens, FRUIT_KEYWORDS, Self::Fruits),
            (&tokens, CARBOHYDRATE_KEYWORDS, Self::Carbohydrates),
            (&tokens, FAT_KEYWORDS, Self::Fats),
            (&tokens, VEGETABLE_KEYWORDS, Self::Vegetables),
        ];

        rules
            .iter()
            .find(|(words, keywords, _)| words.mentions_any(keywords))
            .map_or(Self::Other, |(_, _, category)| *category)
    }

    /// Parse a category label as written by a model, tolerating singular forms
    #[must_use]
    pub fn parse_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "protein" | "proteins" => Some(Self::Protein),
            "carbohydrates" | "carbohydrate" | "carbs" | "grains" => Some(Self::Carbohydrates),
            "vegetables" | "vegetable" => Some(Self::Vegetables),
            "fruits" | "fruit" => Some(Self::Fruits),
            "dairy" => Some(Self::Dairy),
            "fats" | "fat" => Some(Self::Fats),
            "other" => Some(Self::Other),
            _ => None,
        }
    }

    /// Lowercase name as serialized
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Protein => "protein",
            Self::Carbohydrates => "carbohydrates",
            Self::Vegetables => "vegetables",
            Self::Fruits => "fruits",
            Self::Dairy => "dairy",
            Self::Fats => "fats",
            Self::Other => "other",
        }
    }
}

/// How the food was prepared, as judged by the remote model
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PreparationState {
    /// Uncooked ingredient
    Raw,
    /// Cooked in any way
    Cooked,
    /// Packaged or industrially processed
    Processed,
    /// Not reported
    #[default]
    Unknown,
}

impl PreparationState {
    /// Parse a preparation label, mapping anything unrecognized to `Unknown`
    #[must_use]
    pub fn from_str_lossy(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "raw" | "fresh" => Self::Raw,
            "cooked" | "grilled" | "baked" | "fried" | "boiled" | "roasted" => Self::Cooked,
            "processed" | "packaged" => Self::Processed,
            _ => Self::Unknown,
        }
    }
}

/// Which detector proposed a candidate
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    /// On-device classifier
    Local,
    /// Remote vision model
    Remote,
    /// Generic placeholder when detection produced nothing
    Fallback,
}

/// A detector proposal before nutrition is resolved
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoodCandidate {
    /// Food name as reported by the detector
    pub name: String,
    /// Food group
    pub category: FoodCategory,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Estimated portion in grams (always positive)
    pub estimated_weight_grams: f64,
    /// Other names the detector considered
    pub alternative_names: Vec<String>,
    /// Preparation state
    pub preparation_state: PreparationState,
    /// Originating detector
    pub source: DetectionSource,
    /// Position within the originating detector's output
    pub detector_rank: usize,
}

impl FoodCandidate {
    /// Create a candidate with an inferred category and no alternatives
    ///
    /// Confidence is clamped into [0, 1].
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        confidence: f64,
        weight_grams: f64,
        source: DetectionSource,
        detector_rank: usize,
    ) -> Self {
        let name = name.into();
        let category = FoodCategory::infer_from_name(&name);
        Self {
            name,
            category,
            confidence: clamp_unit(confidence),
            estimated_weight_grams: weight_grams,
            alternative_names: Vec::new(),
            preparation_state: PreparationState::Unknown,
            source,
            detector_rank,
        }
    }

    /// Override the inferred category
    #[must_use]
    pub const fn with_category(mut self, category: FoodCategory) -> Self {
        self.category = category;
        self
    }

    /// Set the preparation state
    #[must_use]
    pub const fn with_preparation(mut self, state: PreparationState) -> Self {
        self.preparation_state = state;
        self
    }

    /// Set alternative names
    #[must_use]
    pub fn with_alternatives(mut self, names: Vec<String>) -> Self {
        self.alternative_names = names;
        self
    }

    /// Replace the estimated weight
    #[must_use]
    pub const fn with_weight(mut self, weight_grams: f64) -> Self {
        self.estimated_weight_grams = weight_grams;
        self
    }

    /// Attach resolved nutrition, producing the final immutable item
    #[must_use]
    pub fn into_detected(self, nutrition: NutritionInfo) -> DetectedFoodItem {
        DetectedFoodItem {
            name: self.name,
            category: self.category,
            confidence: self.confidence,
            estimated_weight_grams: self.estimated_weight_grams,
            alternative_names: self.alternative_names,
            preparation_state: self.preparation_state,
            nutrition,
        }
    }
}

/// A food item in a finished analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedFoodItem {
    /// Food name
    pub name: String,
    /// Food group
    pub category: FoodCategory,
    /// Detector confidence in [0, 1]
    pub confidence: f64,
    /// Portion in grams
    pub estimated_weight_grams: f64,
    /// Other names the detector considered
    pub alternative_names: Vec<String>,
    /// Preparation state
    pub preparation_state: PreparationState,
    /// Nutrition for `estimated_weight_grams`
    pub nutrition: NutritionInfo,
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_category() {
        assert_eq!(
            FoodCategory::infer_from_name("Grilled Chicken Breast"),
            FoodCategory::Protein
        );
        assert_eq!(FoodCategory::infer_from_name("brown rice"), FoodCategory::Carbohydrates);
        assert_eq!(FoodCategory::infer_from_name("apple"), FoodCategory::Fruits);
        assert_eq!(FoodCategory::infer_from_name("broccoli"), FoodCategory::Vegetables);
        assert_eq!(FoodCategory::infer_from_name("cheddar"), FoodCategory::Dairy);
        assert_eq!(FoodCategory::infer_from_name("olive oil"), FoodCategory::Fats);
        assert_eq!(FoodCategory::infer_from_name("Mixed Food"), FoodCategory::Other);
    }

    #[test]
    fn test_infer_category_ignores_partial_words() {
        let cases = [
            ("grilled eggplant", FoodCategory::Vegetables),
            ("boiled carrots", FoodCategory::Vegetables),
            ("asparagus spears", FoodCategory::Vegetables),
            ("butternut squash soup", FoodCategory::Vegetables),
            ("peanut butter", FoodCategory::Fats),
            ("fresh strawberries", FoodCategory::Fruits),
            ("two fried eggs", FoodCategory::Protein),
        ];
        for (name, expected) in cases {
            assert_eq!(FoodCategory::infer_from_name(name), expected, "{name}");
        }
    }

    #[test]
    fn test_parse_label() {
        assert_eq!(FoodCategory::parse_label("Fruit"), Some(FoodCategory::Fruits));
        assert_eq!(FoodCategory::parse_label("carbs"), Some(FoodCategory::Carbohydrates));
        assert_eq!(FoodCategory::parse_label("dessert"), None);
    }

    #[test]
    fn test_candidate_clamps_confidence() {
        let candidate = FoodCandidate::new("apple", 1.7, 100.0, DetectionSource::Local, 0);
        assert!((candidate.confidence - 1.0).abs() < f64::EPSILON);

        let candidate = FoodCandidate::new("apple", f64::NAN, 100.0, DetectionSource::Local, 0);
        assert!(candidate.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn test_category_serialization() {
        let json = serde_json::to_string(&FoodCategory::Carbohydrates).unwrap();
        assert_eq!(json, "\"carbohydrates\"");
    }
}
