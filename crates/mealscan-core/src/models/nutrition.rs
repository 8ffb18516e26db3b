// ABOUTME: Nutrition value model with scaling, accumulation, and sanitizing helpers
// ABOUTME: Also names the resolver tier that produced a value
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Nutrient amounts for a stated serving size
///
/// Values are absolute for `serving_size_grams`, never per-100g. Per-100g
/// normalization only happens at the cache storage boundary via [`Self::per_100g`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutritionInfo {
    /// Energy in kcal
    pub calories: f64,
    /// Protein in grams
    pub protein: f64,
    /// Carbohydrates in grams
    pub carbs: f64,
    /// Fat in grams
    pub fat: f64,
    /// Dietary fiber in grams
    pub fiber: f64,
    /// Sugars in grams
    pub sugar: f64,
    /// Sodium in milligrams
    pub sodium: f64,
    /// Serving the amounts refer to
    pub serving_size_grams: f64,
    /// Vitamin amounts keyed by name
    #[serde(default)]
    pub vitamins: BTreeMap<String, f64>,
    /// Mineral amounts keyed by name
    #[serde(default)]
    pub minerals: BTreeMap<String, f64>,
}

impl NutritionInfo {
    /// All-zero nutrition for the given serving
    #[must_use]
    pub fn zero(serving_size_grams: f64) -> Self {
        Self {
            calories: 0.0,
            protein: 0.0,
            carbs: 0.0,
            fat: 0.0,
            fiber: 0.0,
            sugar: 0.0,
            sodium: 0.0,
            serving_size_grams,
            vitamins: BTreeMap::new(),
            minerals: BTreeMap::new(),
        }
    }

    /// Proportionally rescale every field to a new serving size
    ///
    /// A zero or invalid source serving yields zero nutrition at the target weight.
    #[must_use]
    pub fn scaled_to(&self, weight_grams: f64) -> Self {
        if !(self.serving_size_grams.is_finite() && self.serving_size_grams > 0.0) {
            return Self::zero(weight_grams);
        }
        let factor = weight_grams / self.serving_size_grams;
        let scale_map = |map: &BTreeMap<String, f64>| {
            map.iter()
                .map(|(name, amount)| (name.clone(), amount * factor))
                .collect()
        };

        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sugar: self.sugar * factor,
            sodium: self.sodium * factor,
            serving_size_grams: weight_grams,
            vitamins: scale_map(&self.vitamins),
            minerals: scale_map(&self.minerals),
        }
    }

    /// Normalize to a 100 g serving
    #[must_use]
    pub fn per_100g(&self) -> Self {
        self.scaled_to(100.0)
    }

    /// Add another item's nutrition into this total
    pub fn accumulate(&mut self, other: &Self) {
        self.calories += other.calories;
        self.protein += other.protein;
        self.carbs += other.carbs;
        self.fat += other.fat;
        self.fiber += other.fiber;
        self.sugar += other.sugar;
        self.sodium += other.sodium;
        self.serving_size_grams += other.serving_size_grams;
        for (name, amount) in &other.vitamins {
            *self.vitamins.entry(name.clone()).or_insert(0.0) += amount;
        }
        for (name, amount) in &other.minerals {
            *self.minerals.entry(name.clone()).or_insert(0.0) += amount;
        }
    }

    /// Clamp negative or non-finite amounts to zero
    ///
    /// External sources occasionally report negative or NaN values; nothing
    /// downstream should ever see them.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        for field in [
            &mut self.calories,
            &mut self.protein,
            &mut self.carbs,
            &mut self.fat,
            &mut self.fiber,
            &mut self.sugar,
            &mut self.sodium,
        ] {
            *field = non_negative(*field);
        }
        for amount in self.vitamins.values_mut().chain(self.minerals.values_mut()) {
            *amount = non_negative(*amount);
        }
        self
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

/// Resolver tier that produced a nutrition value
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NutritionTier {
    /// Nutrition cache hit
    Cache,
    /// Authoritative nutrient database (USDA)
    Authoritative,
    /// Language model estimate
    Generative,
    /// Fixed-ratio heuristic
    Heuristic,
}

impl NutritionTier {
    /// Name used in logs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cache => "cache",
            Self::Authoritative => "authoritative",
            Self::Generative => "generative",
            Self::Heuristic => "heuristic",
        }
    }
}
