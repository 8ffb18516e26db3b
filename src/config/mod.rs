// ABOUTME: Configuration module for the mealscan server and analysis pipeline
// ABOUTME: Environment-driven settings for thresholds, timeouts, caches, and providers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Configuration module
//!
//! All configuration comes from environment variables with typed defaults:
//!
//! - **Environment**: server host/port and the assembled [`ServerConfig`]
//! - **Pipeline**: detection thresholds, matching, timeouts, breakers
//! - **Cache**: nutrition cache backend selection and Redis connection settings
//! - **Classifier**: on-device model file locations
//! - **Types**: LLM provider selection

use std::env;
use std::str::FromStr;

/// Nutrition cache backend configuration
pub mod cache;
/// On-device classifier model locations
pub mod classifier;
/// Server configuration assembled from the environment
pub mod environment;
/// Analysis pipeline policy knobs
pub mod pipeline;
/// Shared configuration enums
pub mod types;

pub use cache::{NutritionCacheConfig, RedisConnectionConfig};
pub use classifier::ClassifierConfig;
pub use environment::ServerConfig;
pub use pipeline::{
    BreakerSettings, DetectionThresholds, MatchingConfig, PipelineConfig, TimeoutConfig,
};
pub use types::LlmProviderType;

/// Read and parse an environment variable, falling back to `default` when
/// it is unset or does not parse
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}
