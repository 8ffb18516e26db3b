// ABOUTME: Nutrition resolver defaults (portion weights, heuristic ratios, backfill)
// ABOUTME: The heuristic tier uses a blended energy density and fixed macro split
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Portion assumed when nothing better is known
pub const DEFAULT_WEIGHT_GRAMS: f64 = 100.0;

/// Blended energy density of the heuristic tier (kcal per gram)
pub const HEURISTIC_KCAL_PER_GRAM: f64 = 2.0;

/// Share of heuristic calories attributed to protein
pub const HEURISTIC_PROTEIN_RATIO: f64 = 0.15;

/// Share of heuristic calories attributed to carbohydrates
pub const HEURISTIC_CARBS_RATIO: f64 = 0.50;

/// Share of heuristic calories attributed to fat
pub const HEURISTIC_FAT_RATIO: f64 = 0.35;

/// Energy per gram of protein
pub const KCAL_PER_GRAM_PROTEIN: f64 = 4.0;

/// Energy per gram of carbohydrate
pub const KCAL_PER_GRAM_CARBS: f64 = 4.0;

/// Energy per gram of fat
pub const KCAL_PER_GRAM_FAT: f64 = 9.0;

/// Bounded queue between the resolver and the backfill worker
pub const BACKFILL_QUEUE_CAPACITY: usize = 256;

/// USDA search results considered per lookup
pub const DATABASE_SEARCH_PAGE_SIZE: u32 = 5;
