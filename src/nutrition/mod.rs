// ABOUTME: Nutrition resolution module: tiered lookup, fuzzy matching, and cache backfill
// ABOUTME: Exposes the resolver plus the database and estimator seams it depends on
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Background cache backfill queue and worker
pub mod backfill;
/// Authoritative nutrient database trait
pub mod database;
/// LLM-backed nutrition estimates
pub mod estimator;
/// Weight-only fallback estimate
pub mod heuristic;
/// Food-name similarity and keyword generation
pub mod matching;
/// Tiered resolver
pub mod resolver;

pub use backfill::{backfill_channel, BackfillQueue, BackfillStats, BackfillWorker};
pub use database::NutritionDatabase;
pub use estimator::{parse_estimate, LlmNutritionEstimator, NutritionEstimator};
pub use heuristic::heuristic_nutrition;
pub use matching::{best_cache_match, best_name_match, generate_search_keywords, similarity};
pub use resolver::{NutritionResolver, ResolvedNutrition};
