// ABOUTME: Constants module with domain-separated organization
// ABOUTME: Policy defaults and static lookup tables for the mealscan pipeline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Constants module
//!
//! Thresholds here are defaults only. The running service reads its policy
//! knobs from configuration and falls back to these values.

/// Nutrition cache sizing and key namespaces
pub mod cache;
/// Detection and merge policy defaults
pub mod detection;
/// Static keyword tables (categories, synonyms, allergens)
pub mod keywords;
/// Fuzzy name matching defaults
pub mod matching;
/// Redis connection defaults
pub mod redis;
/// Nutrition resolver defaults (weights, heuristic ratios, backfill)
pub mod resolver;
/// USDA `FoodData` Central nutrient identifiers
pub mod usda;
