// ABOUTME: Meal analysis facade: preprocess, detect, resolve nutrition per item, aggregate
// ABOUTME: Builds the full pipeline from server configuration and applies caller weight hints
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Meal Analyzer
//!
//! The single public entry point of the pipeline. `analyze` only ever fails
//! with an [`AnalysisError`]: undecodable bytes or a non-food photo. Every
//! other fault is absorbed by a detector or resolver fallback.

use std::sync::Arc;
use std::time::Instant;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;
use tracing::{info, instrument, warn};

use crate::analysis::aggregate;
use crate::cache::NutritionCache;
use crate::circuit_breaker::CircuitBreaker;
use crate::config::{MatchingConfig, ServerConfig};
use crate::errors::{AnalysisError, AppResult};
use crate::external::{UsdaClient, UsdaClientConfig};
use crate::llm::{ChatProvider, LlmProvider};
use crate::logging::AppLogger;
use crate::models::{DetectionSource, FoodCandidate, MealAnalysisResult};
use crate::nutrition::resolver::{CACHE_BREAKER_NAME, DATABASE_BREAKER_NAME};
use crate::nutrition::{best_name_match, BackfillStats, LlmNutritionEstimator, NutritionResolver};
use crate::vision::{preprocess_with_limit, DetectionOrchestrator, RemoteVisionDetector};

/// Caller-supplied portion weight for a named food
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightHint {
    /// Food name as the caller knows it
    pub food_name: String,
    /// Portion weight in grams
    pub grams: f64,
}

impl WeightHint {
    /// Create a hint
    #[must_use]
    pub fn new(food_name: impl Into<String>, grams: f64) -> Self {
        Self {
            food_name: food_name.into(),
            grams,
        }
    }
}

/// Per-request analysis options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    /// Weight overrides matched to detected items by name
    #[serde(default)]
    pub weight_hints: Vec<WeightHint>,
    /// Portion used for items without a usable weight estimate
    #[serde(default)]
    pub default_weight_grams: Option<f64>,
}

impl AnalysisOptions {
    /// Add a weight hint
    #[must_use]
    pub fn with_hint(mut self, food_name: impl Into<String>, grams: f64) -> Self {
        self.weight_hints.push(WeightHint::new(food_name, grams));
        self
    }

    /// Set the default portion weight
    #[must_use]
    pub const fn with_default_weight(mut self, grams: f64) -> Self {
        self.default_weight_grams = Some(grams);
        self
    }
}

fn usable_weight(grams: f64) -> Option<f64> {
    (grams.is_finite() && grams > 0.0).then_some(grams)
}

/// Apply the caller's default weight and hints to detected candidates
///
/// Local classifier candidates carry no portion estimate, so the caller's
/// default replaces their weight. A hint overrides the weight of every
/// candidate whose name it matches best.
#[must_use]
pub fn apply_weight_options(
    mut candidates: Vec<FoodCandidate>,
    options: &AnalysisOptions,
    matching: &MatchingConfig,
) -> Vec<FoodCandidate> {
    let default_weight = options.default_weight_grams.and_then(usable_weight);
    let hints: Vec<&WeightHint> = options
        .weight_hints
        .iter()
        .filter(|hint| usable_weight(hint.grams).is_some())
        .collect();

    for candidate in &mut candidates {
        if let Some(grams) = default_weight {
            if candidate.source == DetectionSource::Local
                || usable_weight(candidate.estimated_weight_grams).is_none()
            {
                candidate.estimated_weight_grams = grams;
            }
        }

        let names = hints.iter().map(|hint| hint.food_name.as_str());
        if let Some(hint) =
            best_name_match(&candidate.name, names, matching).and_then(|index| hints.get(index))
        {
            candidate.estimated_weight_grams = hint.grams;
        }
    }
    candidates
}

/// End-to-end meal photo analysis
#[derive(Debug, Clone)]
pub struct MealAnalyzer {
    orchestrator: DetectionOrchestrator,
    resolver: NutritionResolver,
    matching: MatchingConfig,
    max_payload_dimension: Option<u32>,
}

impl MealAnalyzer {
    /// Combine a configured orchestrator and resolver
    #[must_use]
    pub fn new(orchestrator: DetectionOrchestrator, resolver: NutritionResolver) -> Self {
        Self {
            orchestrator,
            resolver,
            matching: MatchingConfig::default(),
            max_payload_dimension: None,
        }
    }

    /// Downscale remote vision payloads to at most `limit` pixels per side
    #[must_use]
    pub const fn with_payload_limit(mut self, limit: Option<u32>) -> Self {
        self.max_payload_dimension = limit;
        self
    }

    /// Override the matching used for weight hints
    #[must_use]
    pub const fn with_matching(mut self, matching: MatchingConfig) -> Self {
        self.matching = matching;
        self
    }

    /// Detection stage
    #[must_use]
    pub const fn orchestrator(&self) -> &DetectionOrchestrator {
        &self.orchestrator
    }

    /// Nutrition stage
    #[must_use]
    pub const fn resolver(&self) -> &NutritionResolver {
        &self.resolver
    }

    /// Build the production pipeline from configuration
    ///
    /// Missing optional dependencies (LLM credentials, USDA key, classifier
    /// files) are logged and their stages left out. The returned handle
    /// completes once every clone of the analyzer is dropped and the backfill
    /// queue has drained.
    ///
    /// # Errors
    ///
    /// Returns an error if the pipeline configuration is inconsistent.
    pub async fn from_config(
        config: &ServerConfig,
    ) -> AppResult<(Self, JoinHandle<BackfillStats>)> {
        let pipeline = &config.pipeline;
        pipeline.validate()?;

        let cache = NutritionCache::new(&config.cache).await;
        let breaker_config = pipeline.breaker.to_breaker_config();
        let (mut resolver, backfill_task) =
            NutritionResolver::spawn(cache, pipeline.backfill_queue_capacity);
        resolver = resolver
            .with_cache_breaker(Arc::new(CircuitBreaker::with_config(
                CACHE_BREAKER_NAME,
                breaker_config.clone(),
            )))
            .with_database_breaker(Arc::new(CircuitBreaker::with_config(
                DATABASE_BREAKER_NAME,
                breaker_config,
            )))
            .with_matching(pipeline.matching)
            .with_default_weight(pipeline.default_weight_grams);

        let usda_config = UsdaClientConfig::from_env();
        if usda_config.is_configured() {
            resolver = resolver.with_database(Arc::new(UsdaClient::new(usda_config)));
        }

        let mut orchestrator = DetectionOrchestrator::new(pipeline.detection);
        match ChatProvider::create(config.llm_provider) {
            Ok(provider) => {
                let provider: Arc<dyn LlmProvider> = Arc::new(provider);
                info!(provider = provider.name(), "LLM provider ready");
                orchestrator = orchestrator.with_remote(
                    RemoteVisionDetector::new(provider.clone())
                        .with_timeout(pipeline.timeouts.remote()),
                );
                resolver = resolver.with_estimator(Arc::new(
                    LlmNutritionEstimator::new(provider).with_timeout(pipeline.timeouts.remote()),
                ));
            }
            Err(e) => {
                warn!(error = %e, "No LLM provider, remote vision and generative nutrition disabled");
            }
        }

        orchestrator = Self::attach_local_classifier(orchestrator, config);

        let analyzer = Self::new(orchestrator, resolver)
            .with_matching(pipeline.matching)
            .with_payload_limit(pipeline.max_payload_dimension);
        Ok((analyzer, backfill_task))
    }

    #[cfg(feature = "onnx")]
    fn attach_local_classifier(
        orchestrator: DetectionOrchestrator,
        config: &ServerConfig,
    ) -> DetectionOrchestrator {
        use crate::vision::{LocalClassifier, OnnxClassifier};

        if !config.classifier.is_configured() {
            return orchestrator;
        }
        match OnnxClassifier::from_config(&config.classifier) {
            Ok(backend) => {
                let pipeline = &config.pipeline;
                orchestrator.with_local(
                    LocalClassifier::new(Arc::new(backend))
                        .with_thresholds(&pipeline.detection)
                        .with_default_weight(pipeline.default_weight_grams)
                        .with_timeout(pipeline.timeouts.local()),
                )
            }
            Err(e) => {
                warn!(error = %e, "Local classifier failed to load, running remote-only");
                orchestrator
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    fn attach_local_classifier(
        orchestrator: DetectionOrchestrator,
        config: &ServerConfig,
    ) -> DetectionOrchestrator {
        if config.classifier.is_configured() {
            warn!("Classifier files configured but the onnx feature is disabled");
        }
        orchestrator
    }

    /// Analyze one meal photo
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::Decode`] for unreadable bytes and
    /// [`AnalysisError::NonFoodImage`] when the photo shows no food. No
    /// nutrition lookups happen in either case.
    #[instrument(skip_all, fields(bytes = image_bytes.len(), hints = options.weight_hints.len()))]
    pub async fn analyze(
        &self,
        image_bytes: &[u8],
        options: &AnalysisOptions,
    ) -> Result<MealAnalysisResult, AnalysisError> {
        let started = Instant::now();
        let owned = image_bytes.to_vec();
        let limit = self.max_payload_dimension;
        let image = tokio::task::spawn_blocking(move || preprocess_with_limit(&owned, limit))
            .await
            .map_err(|e| AnalysisError::decode(format!("image preprocessing aborted: {e}")))??;

        let outcome = self.orchestrator.detect(&image).await?;
        let candidates = apply_weight_options(outcome.candidates, options, &self.matching);

        let resolved = join_all(candidates.iter().map(|candidate| {
            self.resolver
                .resolve(&candidate.name, candidate.estimated_weight_grams)
        }))
        .await;

        let (items, sources): (Vec<_>, Vec<_>) = candidates
            .into_iter()
            .zip(resolved)
            .map(|(candidate, resolved)| {
                (candidate.into_detected(resolved.nutrition), resolved.tier)
            })
            .unzip();

        let result = aggregate(items, outcome.classification, outcome.route, sources);
        AppLogger::log_analysis(
            result.detection_route,
            result.detected_foods.len(),
            result.confidence_score,
            started.elapsed(),
        );
        Ok(result)
    }
}
