// ABOUTME: Nutrition cache constants for capacity, cleanup intervals, and key prefixes
// ABOUTME: Shared by the in-memory and Redis cache backends
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Default maximum entries held by the in-memory nutrition cache
pub const DEFAULT_CACHE_MAX_ENTRIES: usize = 10_000;

/// Default cleanup interval in seconds for entries past their retention window
pub const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 300; // 5 minutes

/// Key prefix for all nutrition cache records in Redis
pub const CACHE_KEY_PREFIX: &str = "mealscan:nutrition:";

/// Redis key segment for serialized entries
pub const ENTRY_KEY_SEGMENT: &str = "entry:";

/// Redis key segment for the exact-name index
pub const NAME_KEY_SEGMENT: &str = "name:";

/// Redis key segment for keyword index sorted sets
pub const KEYWORD_KEY_SEGMENT: &str = "kw:";

/// Newest ids kept in each Redis exact-name index list
pub const NAME_INDEX_DEPTH: usize = 16;

/// Upper bound on candidates returned by a keyword search
///
/// Also the number of newest ids kept in each Redis keyword index.
pub const MAX_KEYWORD_CANDIDATES: usize = 50;
