// ABOUTME: Analysis pipeline policy configuration
// ABOUTME: Detection thresholds, name matching, timeouts, and circuit breaker settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env_or;
use crate::circuit_breaker::CircuitBreakerConfig;
use crate::constants::{detection, matching, resolver};
use crate::errors::{AppError, AppResult, ErrorCode};

/// Confidence gates and merge sizing for the detection orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Mean local confidence at which local results are trusted outright
    pub local_trust_threshold: f64,
    /// Local items at or above this survive a merge verbatim
    pub local_keep_threshold: f64,
    /// Classifier scores below this are discarded
    pub classifier_floor: f64,
    /// Maximum classifier labels kept
    pub classifier_top_k: usize,
    /// Merge backfill kicks in below this many items
    pub merge_min_items: usize,
    /// Merge backfill stops at this many items
    pub merge_max_items: usize,
    /// Shared-token ratio for two names to count as duplicates
    pub dedup_token_overlap: f64,
    /// Confidence of the generic fallback item
    pub fallback_confidence: f64,
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self {
            local_trust_threshold: detection::LOCAL_TRUST_THRESHOLD,
            local_keep_threshold: detection::LOCAL_KEEP_THRESHOLD,
            classifier_floor: detection::CLASSIFIER_CONFIDENCE_FLOOR,
            classifier_top_k: detection::CLASSIFIER_TOP_K,
            merge_min_items: detection::MERGE_MIN_ITEMS,
            merge_max_items: detection::MERGE_MAX_ITEMS,
            dedup_token_overlap: detection::DEDUP_TOKEN_OVERLAP,
            fallback_confidence: detection::FALLBACK_CONFIDENCE,
        }
    }
}

impl DetectionThresholds {
    /// Load from `MEALSCAN_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            local_trust_threshold: env_or(
                "MEALSCAN_LOCAL_TRUST_THRESHOLD",
                defaults.local_trust_threshold,
            ),
            local_keep_threshold: env_or(
                "MEALSCAN_LOCAL_KEEP_THRESHOLD",
                defaults.local_keep_threshold,
            ),
            classifier_floor: env_or("MEALSCAN_CLASSIFIER_FLOOR", defaults.classifier_floor),
            classifier_top_k: env_or("MEALSCAN_CLASSIFIER_TOP_K", defaults.classifier_top_k),
            merge_min_items: env_or("MEALSCAN_MERGE_MIN_ITEMS", defaults.merge_min_items),
            merge_max_items: env_or("MEALSCAN_MERGE_MAX_ITEMS", defaults.merge_max_items),
            dedup_token_overlap: env_or(
                "MEALSCAN_DEDUP_TOKEN_OVERLAP",
                defaults.dedup_token_overlap,
            ),
            fallback_confidence: env_or(
                "MEALSCAN_FALLBACK_CONFIDENCE",
                defaults.fallback_confidence,
            ),
        }
    }
}

/// Fuzzy name matching knobs for cache lookups and weight hints
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Best candidate must score strictly above this
    pub accept_threshold: f64,
    /// Score for substring containment
    pub substring_score: f64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            accept_threshold: matching::ACCEPT_THRESHOLD,
            substring_score: matching::SUBSTRING_MATCH_SCORE,
        }
    }
}

impl MatchingConfig {
    /// Load from `MEALSCAN_MATCH_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            accept_threshold: env_or("MEALSCAN_MATCH_ACCEPT_THRESHOLD", matching::ACCEPT_THRESHOLD),
            substring_score: env_or(
                "MEALSCAN_MATCH_SUBSTRING_SCORE",
                matching::SUBSTRING_MATCH_SCORE,
            ),
        }
    }
}

/// Deadlines for the detector suspension points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// Remote vision call deadline in seconds
    pub remote_secs: u64,
    /// Local inference deadline in seconds
    pub local_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            remote_secs: detection::REMOTE_TIMEOUT_SECS,
            local_secs: detection::LOCAL_TIMEOUT_SECS,
        }
    }
}

impl TimeoutConfig {
    /// Load from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            remote_secs: env_or("MEALSCAN_REMOTE_TIMEOUT_SECS", detection::REMOTE_TIMEOUT_SECS),
            local_secs: env_or("MEALSCAN_LOCAL_TIMEOUT_SECS", detection::LOCAL_TIMEOUT_SECS),
        }
    }

    /// Remote deadline as a `Duration`
    #[must_use]
    pub const fn remote(&self) -> Duration {
        Duration::from_secs(self.remote_secs)
    }

    /// Local deadline as a `Duration`
    #[must_use]
    pub const fn local(&self) -> Duration {
        Duration::from_secs(self.local_secs)
    }
}

/// Circuit breaker settings for the resolver's external tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerSettings {
    /// Consecutive failures before opening
    pub failure_threshold: u32,
    /// Cooldown in seconds
    pub recovery_secs: u64,
    /// Successful probes to close
    pub success_threshold: u32,
}

impl Default for BreakerSettings {
    fn default() -> Self {
        let defaults = CircuitBreakerConfig::default();
        Self {
            failure_threshold: defaults.failure_threshold,
            recovery_secs: defaults.recovery_timeout.as_secs(),
            success_threshold: defaults.success_threshold,
        }
    }
}

impl BreakerSettings {
    /// Load from `MEALSCAN_BREAKER_*` environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            failure_threshold: env_or(
                "MEALSCAN_BREAKER_FAILURE_THRESHOLD",
                defaults.failure_threshold,
            ),
            recovery_secs: env_or("MEALSCAN_BREAKER_RECOVERY_SECS", defaults.recovery_secs),
            success_threshold: env_or(
                "MEALSCAN_BREAKER_SUCCESS_THRESHOLD",
                defaults.success_threshold,
            ),
        }
    }

    /// Convert into a breaker configuration
    #[must_use]
    pub const fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig::new(
            self.failure_threshold,
            Duration::from_secs(self.recovery_secs),
            self.success_threshold,
        )
    }
}

/// Full analysis pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Detection gates and merge sizing
    pub detection: DetectionThresholds,
    /// Fuzzy name matching
    pub matching: MatchingConfig,
    /// Detector deadlines
    pub timeouts: TimeoutConfig,
    /// Portion assumed when nothing better is known
    pub default_weight_grams: f64,
    /// Capacity of the backfill queue
    pub backfill_queue_capacity: usize,
    /// Breaker guarding the external tiers
    pub breaker: BreakerSettings,
    /// Longest side of the remote vision payload, `None` sends full resolution
    #[serde(default)]
    pub max_payload_dimension: Option<u32>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            detection: DetectionThresholds::default(),
            matching: MatchingConfig::default(),
            timeouts: TimeoutConfig::default(),
            default_weight_grams: resolver::DEFAULT_WEIGHT_GRAMS,
            backfill_queue_capacity: resolver::BACKFILL_QUEUE_CAPACITY,
            breaker: BreakerSettings::default(),
            max_payload_dimension: None,
        }
    }
}

impl PipelineConfig {
    /// Load the full pipeline configuration from environment
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            detection: DetectionThresholds::from_env(),
            matching: MatchingConfig::from_env(),
            timeouts: TimeoutConfig::from_env(),
            default_weight_grams: env_or(
                "MEALSCAN_DEFAULT_WEIGHT_GRAMS",
                resolver::DEFAULT_WEIGHT_GRAMS,
            ),
            backfill_queue_capacity: env_or(
                "MEALSCAN_BACKFILL_QUEUE_CAPACITY",
                resolver::BACKFILL_QUEUE_CAPACITY,
            ),
            breaker: BreakerSettings::from_env(),
            // unset or 0 keeps the payload at full resolution
            max_payload_dimension: Some(env_or("MEALSCAN_MAX_PAYLOAD_DIMENSION", 0_u32))
                .filter(|limit| *limit > 0),
        }
    }

    /// Reject internally inconsistent settings
    ///
    /// # Errors
    ///
    /// Returns `ConfigInvalid` naming the first offending setting
    pub fn validate(&self) -> AppResult<()> {
        let d = &self.detection;
        let unit_values = [
            ("local_trust_threshold", d.local_trust_threshold),
            ("local_keep_threshold", d.local_keep_threshold),
            ("classifier_floor", d.classifier_floor),
            ("dedup_token_overlap", d.dedup_token_overlap),
            ("fallback_confidence", d.fallback_confidence),
            ("accept_threshold", self.matching.accept_threshold),
            ("substring_score", self.matching.substring_score),
        ];
        if let Some((name, value)) = unit_values
            .iter()
            .find(|(_, value)| !(0.0..=1.0).contains(value))
        {
            return Err(invalid(format!("{name} must be within [0, 1], got {value}")));
        }

        if d.classifier_top_k == 0 {
            return Err(invalid("classifier_top_k must be at least 1"));
        }
        if d.merge_min_items > d.merge_max_items {
            return Err(invalid(format!(
                "merge_min_items ({}) exceeds merge_max_items ({})",
                d.merge_min_items, d.merge_max_items
            )));
        }
        if !(self.default_weight_grams.is_finite() && self.default_weight_grams > 0.0) {
            return Err(invalid("default_weight_grams must be positive"));
        }
        if self.backfill_queue_capacity == 0 {
            return Err(invalid("backfill_queue_capacity must be at least 1"));
        }
        if self.timeouts.remote_secs == 0 || self.timeouts.local_secs == 0 {
            return Err(invalid("detector timeouts must be at least 1 second"));
        }
        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> AppError {
    AppError::new(ErrorCode::ConfigInvalid, message)
}
