// ABOUTME: Adapter around an on-device image classifier producing food candidates
// ABOUTME: Ranks, thresholds, and deduplicates labels; inference runs on the blocking pool under a deadline
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument, warn};

use super::preprocessor::ImageTensor;
use crate::config::DetectionThresholds;
use crate::constants::detection::LOCAL_TIMEOUT_SECS;
use crate::constants::resolver::DEFAULT_WEIGHT_GRAMS;
use crate::errors::AppResult;
use crate::models::{DetectionSource, FoodCandidate};

/// A single classifier output
#[derive(Debug, Clone, PartialEq)]
pub struct LabelScore {
    /// Model label, e.g. `granny_smith`
    pub label: String,
    /// Probability in `[0, 1]`
    pub score: f64,
}

impl LabelScore {
    /// Create a label/score pair
    #[must_use]
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }
}

/// On-device inference engine
///
/// `predict` is synchronous and may be CPU-heavy; callers run it on the
/// blocking thread pool.
pub trait ClassifierBackend: Send + Sync {
    /// Backend identifier for logs
    fn name(&self) -> &'static str;

    /// Whether a model is loaded and ready
    fn is_loaded(&self) -> bool;

    /// Score every known label for the image
    ///
    /// # Errors
    ///
    /// Returns an error when inference fails.
    fn predict(&self, tensor: &ImageTensor) -> AppResult<Vec<LabelScore>>;
}

/// Turns raw classifier scores into ranked food candidates
#[derive(Clone)]
pub struct LocalClassifier {
    backend: Arc<dyn ClassifierBackend>,
    confidence_floor: f64,
    top_k: usize,
    default_weight_grams: f64,
    timeout: Duration,
}

impl LocalClassifier {
    /// Wrap a backend with default thresholds
    #[must_use]
    pub fn new(backend: Arc<dyn ClassifierBackend>) -> Self {
        let thresholds = DetectionThresholds::default();
        Self {
            backend,
            confidence_floor: thresholds.classifier_floor,
            top_k: thresholds.classifier_top_k,
            default_weight_grams: DEFAULT_WEIGHT_GRAMS,
            timeout: Duration::from_secs(LOCAL_TIMEOUT_SECS),
        }
    }

    /// Apply floor and top-K from detection thresholds
    #[must_use]
    pub fn with_thresholds(mut self, thresholds: &DetectionThresholds) -> Self {
        self.confidence_floor = thresholds.classifier_floor;
        self.top_k = thresholds.classifier_top_k;
        self
    }

    /// Weight assigned to every local candidate
    #[must_use]
    pub const fn with_default_weight(mut self, grams: f64) -> Self {
        self.default_weight_grams = grams;
        self
    }

    /// Inference deadline
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Backend name
    #[must_use]
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the backend can serve predictions
    #[must_use]
    pub fn is_available(&self) -> bool {
        self.backend.is_loaded()
    }

    /// Classify an image
    ///
    /// Never fails: an unloaded backend, inference error, panic, or timeout
    /// all yield an empty list.
    #[instrument(skip_all, fields(backend = self.backend.name()))]
    pub async fn classify(&self, tensor: &ImageTensor) -> Vec<FoodCandidate> {
        if !self.backend.is_loaded() {
            warn!("Local classifier backend not loaded");
            return Vec::new();
        }

        let backend = Arc::clone(&self.backend);
        let input = tensor.clone();
        let task = tokio::task::spawn_blocking(move || backend.predict(&input));

        let scores = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(Ok(scores))) => scores,
            Ok(Ok(Err(e))) => {
                warn!(error = %e, "Local classifier prediction failed");
                return Vec::new();
            }
            Ok(Err(join_error)) => {
                warn!(error = %join_error, "Local classifier task panicked");
                return Vec::new();
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timeout.as_secs(),
                    "Local classifier timed out"
                );
                return Vec::new();
            }
        };

        let candidates = self.rank(scores);
        debug!(count = candidates.len(), "Local classifier candidates");
        candidates
    }

    /// Sort, threshold, deduplicate, and truncate raw scores
    #[must_use]
    pub fn rank(&self, mut scores: Vec<LabelScore>) -> Vec<FoodCandidate> {
        scores.retain(|s| s.score.is_finite());
        scores.sort_by(|a, b| b.score.total_cmp(&a.score));

        let mut seen = HashSet::new();
        scores
            .into_iter()
            .filter(|s| s.score >= self.confidence_floor)
            .filter_map(|s| {
                let name = display_label(&s.label);
                (!name.is_empty() && seen.insert(name.to_lowercase())).then_some((name, s.score))
            })
            .take(self.top_k)
            .enumerate()
            .map(|(rank, (name, score))| {
                FoodCandidate::new(
                    name,
                    score,
                    self.default_weight_grams,
                    DetectionSource::Local,
                    rank,
                )
            })
            .collect()
    }
}

impl std::fmt::Debug for LocalClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalClassifier")
            .field("backend", &self.backend.name())
            .field("confidence_floor", &self.confidence_floor)
            .field("top_k", &self.top_k)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// `granny_smith` / `Granny-Smith` to `granny smith`
fn display_label(label: &str) -> String {
    label
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|w| !w.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
