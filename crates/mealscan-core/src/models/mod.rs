// ABOUTME: Core data models for meal photo analysis
// ABOUTME: Re-exports food items, nutrition values, meal classification, and cache entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Data Models
//!
//! Detection-path types live for a single analysis call. Only
//! [`NutritionCacheEntry`] outlives it, and it is never mutated once written.
//!
//! ## Core Models
//!
//! - `FoodCandidate`: a detector proposal before nutrition is attached
//! - `DetectedFoodItem`: a final food item with resolved nutrition
//! - `NutritionInfo`: absolute nutrient amounts for a stated serving size
//! - `MealAnalysisResult`: the immutable output of one analysis

mod cache_entry;
mod food;
mod meal;
mod nutrition;

// Food domain
pub use food::{DetectedFoodItem, DetectionSource, FoodCandidate, FoodCategory, PreparationState};

// Nutrition domain
pub use nutrition::{NutritionInfo, NutritionTier};

// Meal domain
pub use meal::{DetectionRoute, MealAnalysisResult, MealClassification, MealType};

// Cache domain
pub use cache_entry::{NutritionCacheEntry, NutritionSource};
