// ABOUTME: Nutrition cache abstraction with pluggable backends
// ABOUTME: Append-only store supporting exact-name and keyword-containment lookups
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutrition Cache
//!
//! The cache is the resolver's first tier. It is shared by every concurrent
//! analysis, read far more often than written, and never updated in place:
//! backfill appends a fresh entry and readers prefer the newest one.

/// Backend selection from configuration
pub mod factory;
/// In-memory LRU backend
pub mod memory;
/// Redis backend
pub mod redis;

use std::collections::BTreeSet;

use async_trait::async_trait;

pub use factory::NutritionCache;
pub use memory::InMemoryNutritionCache;
pub use redis::RedisNutritionCache;

use crate::errors::AppResult;
use crate::models::NutritionCacheEntry;

/// Storage operations the nutrition resolver needs from a cache backend
///
/// Implementations must be safe to share across tasks; the resolver holds
/// them behind an `Arc<dyn NutritionCacheStore>`.
#[async_trait]
pub trait NutritionCacheStore: Send + Sync {
    /// Newest entry whose normalized name equals `food_name`
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or returns corrupt data
    async fn find_exact(&self, food_name: &str) -> AppResult<Option<NutritionCacheEntry>>;

    /// Entries whose keyword set shares at least one of `keywords`
    ///
    /// Results are bounded and ordered newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or returns corrupt data
    async fn find_by_keywords(
        &self,
        keywords: &BTreeSet<String>,
    ) -> AppResult<Vec<NutritionCacheEntry>>;

    /// Append a new entry
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails
    async fn append(&self, entry: NutritionCacheEntry) -> AppResult<()>;

    /// Number of stored entries
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable
    async fn entry_count(&self) -> AppResult<usize>;

    /// Verify the backend is reachable
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable
    async fn health_check(&self) -> AppResult<()>;

    /// Remove every entry in this cache's namespace
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable
    async fn clear_all(&self) -> AppResult<()>;
}

/// Newest-first ordering shared by all backends
pub(crate) fn sort_newest_first(entries: &mut [NutritionCacheEntry]) {
    entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
