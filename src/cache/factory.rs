// ABOUTME: Nutrition cache factory selecting the backend from configuration
// ABOUTME: Redis when REDIS_URL is set, in-memory LRU otherwise
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::sync::Arc;

use tracing::{info, warn};

use super::{InMemoryNutritionCache, NutritionCacheStore, RedisNutritionCache};
use crate::config::NutritionCacheConfig;

/// Backend-selecting constructor for the shared nutrition cache
pub struct NutritionCache;

impl NutritionCache {
    /// Build the configured backend
    ///
    /// A Redis connection failure is not fatal: the service falls back to the
    /// in-memory cache so analyses keep working, only without sharing.
    pub async fn new(config: &NutritionCacheConfig) -> Arc<dyn NutritionCacheStore> {
        if config.redis_url.is_some() {
            match RedisNutritionCache::connect(config).await {
                Ok(cache) => {
                    info!("Using Redis nutrition cache");
                    return Arc::new(cache);
                }
                Err(e) => {
                    warn!(error = %e, "Redis nutrition cache unavailable, using in-memory cache");
                }
            }
        }

        info!(
            "Initializing in-memory nutrition cache (max entries: {})",
            config.max_entries
        );
        Arc::new(InMemoryNutritionCache::new(config))
    }

    /// Build the backend described by environment variables
    pub async fn from_env() -> Arc<dyn NutritionCacheStore> {
        Self::new(&NutritionCacheConfig::from_env()).await
    }
}
