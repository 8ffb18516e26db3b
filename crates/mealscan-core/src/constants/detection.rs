// ABOUTME: Detection orchestration defaults (trust, keep, floor, merge sizes)
// ABOUTME: Values are starting points; the pipeline config can override each one
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Mean local confidence at or above which local results are trusted outright
pub const LOCAL_TRUST_THRESHOLD: f64 = 0.7;

/// Local items at or above this confidence survive a merge verbatim
pub const LOCAL_KEEP_THRESHOLD: f64 = 0.6;

/// Classifier scores below this floor are discarded
pub const CLASSIFIER_CONFIDENCE_FLOOR: f64 = 0.1;

/// Maximum labels kept from the local classifier
pub const CLASSIFIER_TOP_K: usize = 5;

/// Merged results smaller than this are backfilled from leftover local items
pub const MERGE_MIN_ITEMS: usize = 3;

/// Backfill stops once a merged result reaches this size
pub const MERGE_MAX_ITEMS: usize = 5;

/// Shared-token ratio at which two names count as the same food
pub const DEDUP_TOKEN_OVERLAP: f64 = 0.5;

/// Name of the generic placeholder item used when detection yields nothing
pub const FALLBACK_FOOD_NAME: &str = "Mixed Food";

/// Confidence of the generic placeholder item
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Assumed portion for the generic placeholder item
pub const FALLBACK_WEIGHT_GRAMS: f64 = 150.0;

/// Hard deadline for the remote vision call
pub const REMOTE_TIMEOUT_SECS: u64 = 20;

/// Deadline for one local inference pass
pub const LOCAL_TIMEOUT_SECS: u64 = 5;

/// Classifier input edge length in pixels
pub const TENSOR_SIZE: u32 = 224;

