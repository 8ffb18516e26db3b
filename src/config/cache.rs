// ABOUTME: Nutrition cache configuration types
// ABOUTME: Backend selection (Redis or in-memory), capacity, and Redis retry settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;

use serde::{Deserialize, Serialize};

use super::env_or;
use crate::constants::{cache, redis};

/// Nutrition cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutritionCacheConfig {
    /// Redis URL; in-memory cache is used when absent
    #[serde(default)]
    pub redis_url: Option<String>,
    /// Maximum entries in the in-memory cache
    pub max_entries: usize,
    /// Start the in-memory cleanup task (disabled in tests)
    #[serde(default)]
    pub enable_background_cleanup: bool,
    /// Cleanup interval in seconds
    pub cleanup_interval_secs: u64,
    /// Entries older than this are dropped; `None` keeps them indefinitely
    #[serde(default)]
    pub retention_secs: Option<u64>,
    /// Redis connection configuration
    #[serde(default)]
    pub redis_connection: RedisConnectionConfig,
}

impl Default for NutritionCacheConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            max_entries: cache::DEFAULT_CACHE_MAX_ENTRIES,
            enable_background_cleanup: false,
            cleanup_interval_secs: cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            retention_secs: None,
            redis_connection: RedisConnectionConfig::default(),
        }
    }
}

impl NutritionCacheConfig {
    /// Load cache configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            redis_url: env::var("REDIS_URL").ok().filter(|url| !url.trim().is_empty()),
            max_entries: env_or("NUTRITION_CACHE_MAX_ENTRIES", cache::DEFAULT_CACHE_MAX_ENTRIES),
            enable_background_cleanup: true,
            cleanup_interval_secs: env_or(
                "NUTRITION_CACHE_CLEANUP_INTERVAL_SECS",
                cache::DEFAULT_CLEANUP_INTERVAL_SECS,
            ),
            retention_secs: env::var("NUTRITION_CACHE_RETENTION_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|secs| *secs > 0),
            redis_connection: RedisConnectionConfig::from_env(),
        }
    }
}

/// Redis connection and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConnectionConfig {
    /// Connection timeout in seconds
    pub connection_timeout_secs: u64,
    /// Response/command timeout in seconds
    pub response_timeout_secs: u64,
    /// Number of reconnection retries after connection drop
    pub reconnection_retries: usize,
    /// Exponential backoff base for retry delays
    pub retry_exponent_base: u64,
    /// Maximum retry delay in milliseconds
    pub max_retry_delay_ms: u64,
    /// Number of retries for initial connection at startup
    pub initial_connection_retries: u32,
    /// Initial retry delay in milliseconds (doubles with exponential backoff)
    pub initial_retry_delay_ms: u64,
}

impl Default for RedisConnectionConfig {
    fn default() -> Self {
        Self {
            connection_timeout_secs: redis::CONNECTION_TIMEOUT_SECS,
            response_timeout_secs: redis::RESPONSE_TIMEOUT_SECS,
            reconnection_retries: redis::RECONNECTION_RETRIES,
            retry_exponent_base: redis::RETRY_EXPONENT_BASE,
            max_retry_delay_ms: redis::MAX_RETRY_DELAY_MS,
            initial_connection_retries: redis::INITIAL_CONNECTION_RETRIES,
            initial_retry_delay_ms: redis::INITIAL_RETRY_DELAY_MS,
        }
    }
}

impl RedisConnectionConfig {
    /// Load Redis connection configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            connection_timeout_secs: env_or(
                "REDIS_CONNECTION_TIMEOUT_SECS",
                redis::CONNECTION_TIMEOUT_SECS,
            ),
            response_timeout_secs: env_or("REDIS_RESPONSE_TIMEOUT_SECS", redis::RESPONSE_TIMEOUT_SECS),
            reconnection_retries: env_or("REDIS_RECONNECTION_RETRIES", redis::RECONNECTION_RETRIES),
            retry_exponent_base: env_or("REDIS_RETRY_EXPONENT_BASE", redis::RETRY_EXPONENT_BASE),
            max_retry_delay_ms: env_or("REDIS_MAX_RETRY_DELAY_MS", redis::MAX_RETRY_DELAY_MS),
            initial_connection_retries: env_or(
                "REDIS_INITIAL_CONNECTION_RETRIES",
                redis::INITIAL_CONNECTION_RETRIES,
            ),
            initial_retry_delay_ms: env_or(
                "REDIS_INITIAL_RETRY_DELAY_MS",
                redis::INITIAL_RETRY_DELAY_MS,
            ),
        }
    }
}
