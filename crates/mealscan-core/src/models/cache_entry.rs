// ABOUTME: Persisted nutrition cache entry written by resolver backfill
// ABOUTME: Append-only records normalized to 100 g with search keywords
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::NutritionInfo;

/// Which tier originally produced a cached value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NutritionSource {
    /// Authoritative nutrient database
    Authoritative,
    /// Language model estimate
    GenerativeBackfill,
}

/// A nutrition record in the shared cache
///
/// Entries are never updated in place. A newer entry for the same name
/// supersedes older ones at read time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionCacheEntry {
    /// Unique entry id
    pub id: Uuid,
    /// Normalized (lowercased, trimmed) food name
    pub food_name: String,
    /// Keywords used for fuzzy lookup
    pub search_keywords: BTreeSet<String>,
    /// Nutrition for a 100 g serving
    pub nutrition_per_100g: NutritionInfo,
    /// Originating tier
    pub source: NutritionSource,
    /// Write time
    pub created_at: DateTime<Utc>,
}

impl NutritionCacheEntry {
    /// Build a new entry, normalizing the nutrition to 100 g
    #[must_use]
    pub fn new(
        food_name: &str,
        search_keywords: BTreeSet<String>,
        nutrition: &NutritionInfo,
        source: NutritionSource,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            food_name: Self::normalize_name(food_name),
            search_keywords,
            nutrition_per_100g: nutrition.per_100g().sanitized(),
            source,
            created_at: Utc::now(),
        }
    }

    /// Canonical form of a food name used as the exact-match key
    ///
    /// Lowercased with runs of whitespace collapsed to single spaces.
    #[must_use]
    pub fn normalize_name(name: &str) -> String {
        name.split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
    }

    /// Nutrition scaled to the requested weight
    #[must_use]
    pub fn nutrition_for(&self, weight_grams: f64) -> NutritionInfo {
        self.nutrition_per_100g.scaled_to(weight_grams)
    }
}
