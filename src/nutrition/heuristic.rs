// ABOUTME: Last-resort nutrition estimate derived only from portion weight
// ABOUTME: Fixed energy density with a 15/50/35 protein/carbs/fat calorie split
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use crate::constants::resolver::{
    HEURISTIC_CARBS_RATIO, HEURISTIC_FAT_RATIO, HEURISTIC_KCAL_PER_GRAM, HEURISTIC_PROTEIN_RATIO,
    KCAL_PER_GRAM_CARBS, KCAL_PER_GRAM_FAT, KCAL_PER_GRAM_PROTEIN,
};
use crate::models::NutritionInfo;

/// Generic mixed-food nutrition for a portion of `weight_grams`
///
/// Fiber, sugar, sodium and micronutrients stay at zero.
#[must_use]
pub fn heuristic_nutrition(weight_grams: f64) -> NutritionInfo {
    let calories = HEURISTIC_KCAL_PER_GRAM * weight_grams;
    NutritionInfo {
        calories,
        protein: calories * HEURISTIC_PROTEIN_RATIO / KCAL_PER_GRAM_PROTEIN,
        carbs: calories * HEURISTIC_CARBS_RATIO / KCAL_PER_GRAM_CARBS,
        fat: calories * HEURISTIC_FAT_RATIO / KCAL_PER_GRAM_FAT,
        ..NutritionInfo::zero(weight_grams)
    }
}
