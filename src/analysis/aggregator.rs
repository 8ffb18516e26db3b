// ABOUTME: Pure aggregation of resolved food items into a meal analysis result
// ABOUTME: Totals nutrients, picks the dominant category, averages confidence, flags allergens
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use chrono::Utc;

use super::allergens::detect_allergens;
use crate::constants::resolver::DEFAULT_WEIGHT_GRAMS;
use crate::models::{
    DetectedFoodItem, DetectionRoute, FoodCategory, MealAnalysisResult, MealClassification,
    NutritionInfo, NutritionTier,
};

/// Sum of every item's nutrition
///
/// `serving_size_grams` is the summed serving of the item nutrition values,
/// or 100 g for no items.
#[must_use]
pub fn total_nutrition(items: &[DetectedFoodItem]) -> NutritionInfo {
    if items.is_empty() {
        return NutritionInfo::zero(DEFAULT_WEIGHT_GRAMS);
    }
    let mut total = NutritionInfo::zero(0.0);
    for item in items {
        total.accumulate(&item.nutrition);
    }
    total
}

/// Category with the largest confidence sum, first seen wins ties
#[must_use]
pub fn primary_category(items: &[DetectedFoodItem]) -> FoodCategory {
    let mut sums: Vec<(FoodCategory, f64)> = Vec::new();
    for item in items {
        match sums.iter_mut().find(|(category, _)| *category == item.category) {
            Some((_, sum)) => *sum += item.confidence,
            None => sums.push((item.category, item.confidence)),
        }
    }

    let mut best: Option<(FoodCategory, f64)> = None;
    for (category, sum) in sums {
        // strict comparison keeps the earlier category on equal sums
        match best {
            Some((_, best_sum)) if sum <= best_sum => {}
            _ => best = Some((category, sum)),
        }
    }
    best.map_or(FoodCategory::Other, |(category, _)| category)
}

/// Mean item confidence clamped to `[0, 1]`, 0.0 for no items
#[must_use]
pub fn overall_confidence(items: &[DetectedFoodItem]) -> f64 {
    if items.is_empty() {
        return 0.0;
    }
    let mean = items.iter().map(|item| item.confidence).sum::<f64>() / items.len() as f64;
    if mean.is_finite() {
        mean.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Assemble the final analysis result
///
/// `sources` must be parallel to `items`.
#[must_use]
pub fn aggregate(
    items: Vec<DetectedFoodItem>,
    classification: MealClassification,
    route: DetectionRoute,
    sources: Vec<NutritionTier>,
) -> MealAnalysisResult {
    MealAnalysisResult {
        total_nutrition: total_nutrition(&items),
        confidence_score: overall_confidence(&items),
        primary_food_category: primary_category(&items),
        allergen_warnings: detect_allergens(&items),
        meal_type: classification.meal_type,
        meal_type_confidence: classification.confidence,
        meal_type_reason: classification.reason,
        analysis_timestamp: Utc::now(),
        detection_route: route,
        nutrition_sources: sources,
        detected_foods: items,
    }
}
