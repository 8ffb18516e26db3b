// ABOUTME: Fuzzy food-name matching defaults
// ABOUTME: Similarity scores and the acceptance threshold for cache hits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Score for an exact (normalized) name match
pub const EXACT_MATCH_SCORE: f64 = 1.0;

/// Score when one name contains the other
pub const SUBSTRING_MATCH_SCORE: f64 = 0.8;

/// A cache candidate must score strictly above this to be accepted
pub const ACCEPT_THRESHOLD: f64 = 0.6;

/// Words of this length or shorter are not used as search keywords
pub const MIN_KEYWORD_LEN: usize = 2;
