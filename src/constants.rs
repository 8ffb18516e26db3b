// ABOUTME: Re-export of pipeline policy constants from mealscan-core
// ABOUTME: Thresholds, USDA nutrient identifiers, cache key layout and keyword tables
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use mealscan_core::constants::*;
