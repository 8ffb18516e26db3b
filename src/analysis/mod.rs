// ABOUTME: Result aggregation for finished meal analyses
// ABOUTME: Nutrient totals, dominant category, confidence and allergen warnings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Result assembly
pub mod aggregator;
/// Allergen keyword matching
pub mod allergens;

pub use aggregator::{aggregate, overall_confidence, primary_category, total_nutrition};
pub use allergens::{allergens_in_names, detect_allergens};
