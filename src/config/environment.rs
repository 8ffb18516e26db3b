// ABOUTME: Server configuration assembled from environment variables
// ABOUTME: Network binding, request limits, and the nested pipeline/cache/provider settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Environment-based configuration for deployment

use std::env;

use tracing::{info, warn};

use super::{env_or, ClassifierConfig, LlmProviderType, NutritionCacheConfig, PipelineConfig};
use crate::errors::AppResult;

/// Default HTTP port
pub const DEFAULT_HTTP_PORT: u16 = 8081;

/// Default request body limit (photos up to 10 MiB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Complete server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// HTTP port
    pub http_port: u16,
    /// Maximum accepted image upload size in bytes
    pub max_body_bytes: usize,
    /// Analysis pipeline policy
    pub pipeline: PipelineConfig,
    /// Nutrition cache backend
    pub cache: NutritionCacheConfig,
    /// LLM provider for vision and estimation
    pub llm_provider: LlmProviderType,
    /// On-device classifier files
    pub classifier: ClassifierConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            http_port: DEFAULT_HTTP_PORT,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            pipeline: PipelineConfig::default(),
            cache: NutritionCacheConfig::default(),
            llm_provider: LlmProviderType::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline settings are inconsistent
    pub fn from_env() -> AppResult<Self> {
        info!("Loading configuration from environment variables");

        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            http_port: env_or("HTTP_PORT", DEFAULT_HTTP_PORT),
            max_body_bytes: env_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_BODY_BYTES),
            pipeline: PipelineConfig::from_env(),
            cache: NutritionCacheConfig::from_env(),
            llm_provider: LlmProviderType::from_env(),
            classifier: ClassifierConfig::from_env(),
        };
        config.pipeline.validate()?;

        if env::var("USDA_API_KEY").is_err() {
            warn!("USDA_API_KEY not set, authoritative nutrition lookups will be skipped");
        }

        Ok(config)
    }

    /// Summary line for startup logs
    #[must_use]
    pub fn summary(&self) -> String {
        format!(
            "host={} port={} llm={} cache={} local_classifier={}",
            self.host,
            self.http_port,
            self.llm_provider,
            if self.cache.redis_url.is_some() {
                "redis"
            } else {
                "memory"
            },
            self.classifier.is_configured()
        )
    }
}
