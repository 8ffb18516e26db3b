// ABOUTME: Multi-tier nutrition resolution: cache, authoritative database, LLM estimate, heuristic
// ABOUTME: Breaker-guarded tiers with asynchronous cache backfill of every external answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Nutrition Resolver
//!
//! `resolve` never fails. Each tier is tried only when the previous one
//! produced nothing, and a failing tier is logged and skipped:
//!
//! 1. nutrition cache (exact name, then keyword search with fuzzy scoring)
//! 2. authoritative database, backfilled into the cache
//! 3. generative estimator, backfilled into the cache
//! 4. fixed-ratio heuristic
//!
//! The cache and the database each sit behind a shared [`CircuitBreaker`] so a
//! dead dependency costs one fast refusal per lookup instead of a timeout.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn, Span};

use super::backfill::{backfill_channel, BackfillQueue, BackfillStats};
use super::database::NutritionDatabase;
use super::estimator::NutritionEstimator;
use super::heuristic::heuristic_nutrition;
use super::matching::{best_cache_match, generate_search_keywords};
use crate::cache::NutritionCacheStore;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::MatchingConfig;
use crate::constants::resolver::DEFAULT_WEIGHT_GRAMS;
use crate::errors::AppResult;
use crate::logging::AppLogger;
use crate::models::{NutritionCacheEntry, NutritionInfo, NutritionSource, NutritionTier};

/// Breaker name for the cache tier
pub const CACHE_BREAKER_NAME: &str = "nutrition_cache";
/// Breaker name for the authoritative database tier
pub const DATABASE_BREAKER_NAME: &str = "nutrition_database";

/// Nutrition for one food plus the tier that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedNutrition {
    /// Absolute values for the requested weight
    pub nutrition: NutritionInfo,
    /// Producing tier
    pub tier: NutritionTier,
}

/// Resolves a food name and portion weight to nutrition values
#[derive(Clone)]
pub struct NutritionResolver {
    cache: Arc<dyn NutritionCacheStore>,
    cache_breaker: Arc<CircuitBreaker>,
    database: Option<Arc<dyn NutritionDatabase>>,
    database_breaker: Arc<CircuitBreaker>,
    estimator: Option<Arc<dyn NutritionEstimator>>,
    backfill: BackfillQueue,
    matching: MatchingConfig,
    default_weight_grams: f64,
}

impl NutritionResolver {
    /// Resolver over `cache` that backfills through `backfill`
    ///
    /// Starts with no database or estimator and default breakers.
    #[must_use]
    pub fn new(cache: Arc<dyn NutritionCacheStore>, backfill: BackfillQueue) -> Self {
        Self {
            cache,
            cache_breaker: Arc::new(CircuitBreaker::new(CACHE_BREAKER_NAME)),
            database: None,
            database_breaker: Arc::new(CircuitBreaker::new(DATABASE_BREAKER_NAME)),
            estimator: None,
            backfill,
            matching: MatchingConfig::default(),
            default_weight_grams: DEFAULT_WEIGHT_GRAMS,
        }
    }

    /// Resolver plus a spawned backfill worker writing into the same cache
    ///
    /// The worker stops once every clone of the resolver has been dropped.
    #[must_use]
    pub fn spawn(
        cache: Arc<dyn NutritionCacheStore>,
        queue_capacity: usize,
    ) -> (Self, JoinHandle<BackfillStats>) {
        let (queue, worker) = backfill_channel(queue_capacity, cache.clone());
        (Self::new(cache, queue), worker.spawn())
    }

    /// Enable the authoritative database tier
    #[must_use]
    pub fn with_database(mut self, database: Arc<dyn NutritionDatabase>) -> Self {
        self.database = Some(database);
        self
    }

    /// Enable the generative estimator tier
    #[must_use]
    pub fn with_estimator(mut self, estimator: Arc<dyn NutritionEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// Share an externally owned cache breaker
    #[must_use]
    pub fn with_cache_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.cache_breaker = breaker;
        self
    }

    /// Share an externally owned database breaker
    #[must_use]
    pub fn with_database_breaker(mut self, breaker: Arc<CircuitBreaker>) -> Self {
        self.database_breaker = breaker;
        self
    }

    /// Override fuzzy-match scoring
    #[must_use]
    pub const fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Weight used when a caller passes a non-positive or non-finite one
    #[must_use]
    pub const fn with_default_weight(mut self, grams: f64) -> Self {
        self.default_weight_grams = grams;
        self
    }

    /// Breaker guarding the cache tier
    #[must_use]
    pub const fn cache_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.cache_breaker
    }

    /// Breaker guarding the database tier
    #[must_use]
    pub const fn database_breaker(&self) -> &Arc<CircuitBreaker> {
        &self.database_breaker
    }

    /// The shared cache store
    #[must_use]
    pub fn cache(&self) -> &Arc<dyn NutritionCacheStore> {
        &self.cache
    }

    fn effective_weight(&self, weight_grams: f64) -> f64 {
        if weight_grams.is_finite() && weight_grams > 0.0 {
            weight_grams
        } else {
            self.default_weight_grams
        }
    }

    /// Resolve nutrition for `weight_grams` of `food_name`
    #[instrument(skip(self), fields(food = %food_name, tier = tracing::field::Empty))]
    pub async fn resolve(&self, food_name: &str, weight_grams: f64) -> ResolvedNutrition {
        let started = Instant::now();
        let weight = self.effective_weight(weight_grams);

        let resolved = if food_name.trim().is_empty() {
            debug!("Blank food name, using heuristic");
            Self::heuristic(weight)
        } else if let Some(nutrition) = self.cache_tier(food_name, weight).await {
            ResolvedNutrition {
                nutrition,
                tier: NutritionTier::Cache,
            }
        } else if let Some(nutrition) = self.database_tier(food_name, weight).await {
            ResolvedNutrition {
                nutrition,
                tier: NutritionTier::Authoritative,
            }
        } else if let Some(nutrition) = self.estimator_tier(food_name, weight).await {
            ResolvedNutrition {
                nutrition,
                tier: NutritionTier::Generative,
            }
        } else {
            Self::heuristic(weight)
        };

        Span::current().record("tier", resolved.tier.as_str());
        AppLogger::log_resolution(food_name, weight, resolved.tier, started.elapsed());
        resolved
    }

    fn heuristic(weight: f64) -> ResolvedNutrition {
        ResolvedNutrition {
            nutrition: heuristic_nutrition(weight),
            tier: NutritionTier::Heuristic,
        }
    }

    async fn lookup_cache(&self, food_name: &str) -> AppResult<Option<NutritionCacheEntry>> {
        if let Some(entry) = self.cache.find_exact(food_name).await? {
            return Ok(Some(entry));
        }

        let keywords = generate_search_keywords(food_name);
        if keywords.is_empty() {
            return Ok(None);
        }
        let candidates = self.cache.find_by_keywords(&keywords).await?;
        Ok(
            best_cache_match(food_name, &candidates, &self.matching).map(|(entry, score)| {
                debug!(matched = %entry.food_name, score, "Fuzzy cache match");
                entry.clone()
            }),
        )
    }

    async fn cache_tier(&self, food_name: &str, weight: f64) -> Option<NutritionInfo> {
        match self.cache_breaker.call(self.lookup_cache(food_name)).await {
            Ok(hit) => hit.map(|entry| entry.nutrition_for(weight)),
            Err(e) => {
                warn!(error = %e, "Nutrition cache tier skipped");
                None
            }
        }
    }

    async fn database_tier(&self, food_name: &str, weight: f64) -> Option<NutritionInfo> {
        let database = self.database.as_ref()?;
        let per_100g = match self
            .database_breaker
            .call(database.lookup_per_100g(food_name))
            .await
        {
            Ok(Some(per_100g)) => per_100g.sanitized(),
            Ok(None) => {
                debug!(database = database.name(), "No database match");
                return None;
            }
            Err(e) => {
                warn!(database = database.name(), error = %e, "Nutrition database tier skipped");
                return None;
            }
        };

        self.enqueue_backfill(food_name, &per_100g, NutritionSource::Authoritative);
        Some(per_100g.scaled_to(weight))
    }

    async fn estimator_tier(&self, food_name: &str, weight: f64) -> Option<NutritionInfo> {
        let estimator = self.estimator.as_ref()?;
        match estimator.estimate(food_name, weight).await {
            Ok(nutrition) => {
                self.enqueue_backfill(food_name, &nutrition, NutritionSource::GenerativeBackfill);
                Some(nutrition)
            }
            Err(e) => {
                warn!(estimator = estimator.name(), error = %e, "Generative tier skipped");
                None
            }
        }
    }

    fn enqueue_backfill(&self, food_name: &str, nutrition: &NutritionInfo, source: NutritionSource) {
        let entry = NutritionCacheEntry::new(
            food_name,
            generate_search_keywords(food_name),
            nutrition,
            source,
        );
        if self.backfill.enqueue(entry) {
            info!(source = ?source, "Queued nutrition cache backfill");
        }
    }
}

impl std::fmt::Debug for NutritionResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NutritionResolver")
            .field("cache_breaker", &self.cache_breaker)
            .field("database", &self.database.as_ref().map(|d| d.name()))
            .field("database_breaker", &self.database_breaker)
            .field("estimator", &self.estimator.as_ref().map(|e| e.name()))
            .field("matching", &self.matching)
            .field("default_weight_grams", &self.default_weight_grams)
            .finish_non_exhaustive()
    }
}
