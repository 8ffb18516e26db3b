// ABOUTME: Authoritative nutrient database seam used by the resolver's second tier
// ABOUTME: Implemented by the USDA FoodData Central client and its offline mock
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use async_trait::async_trait;

use crate::errors::AppResult;
use crate::models::NutritionInfo;

/// Source of authoritative per-100g nutrition values
#[async_trait]
pub trait NutritionDatabase: Send + Sync {
    /// Short identifier used in logs and breaker names
    fn name(&self) -> &'static str;

    /// Look up a food by free-text name
    ///
    /// Returns `Ok(None)` when the database has no match, which lets the
    /// resolver fall through without tripping its breaker.
    ///
    /// # Errors
    ///
    /// Returns an error when the database cannot be queried.
    async fn lookup_per_100g(&self, food_name: &str) -> AppResult<Option<NutritionInfo>>;
}
