// ABOUTME: Shared fakes and fixtures for integration tests
// ABOUTME: Scripted LLM provider, fake classifier, failing stores and databases, test images
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate,
    clippy::unwrap_used
)]
//! Shared test utilities for `mealscan`
//!
//! Every external dependency of the pipeline has a deterministic stand-in
//! here so tests never touch the network.

use std::collections::BTreeSet;
use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use std::time::Duration;

use async_trait::async_trait;
use image::{ImageFormat, Rgb, RgbImage};
use mealscan::cache::{InMemoryNutritionCache, NutritionCacheStore};
use mealscan::errors::{AppError, AppResult};
use mealscan::llm::{ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use mealscan::models::{NutritionCacheEntry, NutritionInfo};
use mealscan::nutrition::{NutritionDatabase, NutritionEstimator};
use mealscan::vision::{ClassifierBackend, ImageTensor, LabelScore};

static INIT_LOGGER: Once = Once::new();

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .init();
    });
}

// ============================================================================
// Images
// ============================================================================

/// Solid-color PNG of the given size
pub fn solid_png(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut bytes = Cursor::new(Vec::new());
    img.write_to(&mut bytes, ImageFormat::Png).unwrap();
    bytes.into_inner()
}

/// Small red square, stands in for a photo of an apple
pub fn apple_photo() -> Vec<u8> {
    solid_png(64, 64, [200, 30, 30])
}

// ============================================================================
// Vision replies
// ============================================================================

pub const APPLE_VISION_REPLY: &str = r#"{
  "contains_food": true,
  "detected_content": "a red apple on a table",
  "meal_type": "ingredients",
  "meal_type_confidence": 0.9,
  "meal_type_reason": "single raw fruit",
  "foods": [
    {"name": "apple", "estimated_weight": 182, "confidence": 0.9, "category": "fruits", "preparation_state": "raw"}
  ]
}"#;

pub const CAR_VISION_REPLY: &str = r#"{
  "contains_food": false,
  "detected_content": "a red car parked on a street"
}"#;

pub const PLATE_VISION_REPLY: &str = r#"```json
{
  "contains_food": true,
  "detected_content": "grilled chicken with rice",
  "meal_type": "ready_made",
  "meal_type_confidence": 0.8,
  "meal_type_reason": "plated cooked dish",
  "foods": [
    {"name": "grilled chicken breast", "estimated_weight": 150, "confidence": 0.85, "category": "protein", "preparation_state": "cooked"},
    {"name": "white rice", "estimated_weight": 180, "confidence": 0.8, "category": "carbohydrates", "preparation_state": "cooked"}
  ]
}
```"#;

pub const APPLE_ESTIMATE_REPLY: &str =
    r#"{"calories": 95, "protein": 0.5, "carbs": 25, "fat": 0.3, "fiber": 4.4, "sugar": 19}"#;

// ============================================================================
// LLM provider
// ============================================================================

/// LLM provider replaying fixed answers
///
/// Requests carrying an image get the vision reply; text-only requests get
/// the estimate reply. `None` makes that kind of call fail.
pub struct ScriptedLlmProvider {
    vision_reply: Option<String>,
    estimate_reply: Option<String>,
    delay: Option<Duration>,
    vision_calls: AtomicUsize,
    estimate_calls: AtomicUsize,
}

impl ScriptedLlmProvider {
    pub fn new() -> Self {
        Self {
            vision_reply: None,
            estimate_reply: None,
            delay: None,
            vision_calls: AtomicUsize::new(0),
            estimate_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_vision(mut self, reply: &str) -> Self {
        self.vision_reply = Some(reply.to_owned());
        self
    }

    pub fn with_estimate(mut self, reply: &str) -> Self {
        self.estimate_reply = Some(reply.to_owned());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn vision_calls(&self) -> usize {
        self.vision_calls.load(Ordering::SeqCst)
    }

    pub fn estimate_calls(&self) -> usize {
        self.estimate_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedLlmProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::multimodal_json()
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let reply = if request.has_images() {
            self.vision_calls.fetch_add(1, Ordering::SeqCst);
            self.vision_reply.clone()
        } else {
            self.estimate_calls.fetch_add(1, Ordering::SeqCst);
            self.estimate_reply.clone()
        };
        reply
            .map(|content| ChatResponse {
                content,
                model: "scripted-1".to_owned(),
                finish_reason: Some("stop".to_owned()),
            })
            .ok_or_else(|| AppError::external_unavailable("scripted", "no reply configured"))
    }
}

// ============================================================================
// Local classifier
// ============================================================================

/// Classifier backend returning fixed scores
pub struct FakeClassifierBackend {
    scores: Vec<LabelScore>,
    loaded: bool,
    fail: bool,
    delay: Option<Duration>,
    predictions: AtomicUsize,
}

impl FakeClassifierBackend {
    pub fn with_scores(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(label, score)| LabelScore::new(*label, *score))
                .collect(),
            loaded: true,
            fail: false,
            delay: None,
            predictions: AtomicUsize::new(0),
        }
    }

    pub fn predictions(&self) -> usize {
        self.predictions.load(Ordering::SeqCst)
    }

    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::with_scores(&[])
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::with_scores(&[])
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::with_scores(&[("apple", 0.9)])
        }
    }
}

impl ClassifierBackend for FakeClassifierBackend {
    fn name(&self) -> &'static str {
        "fake"
    }

    fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn predict(&self, _tensor: &ImageTensor) -> AppResult<Vec<LabelScore>> {
        self.predictions.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        if self.fail {
            return Err(AppError::internal("inference failed"));
        }
        Ok(self.scores.clone())
    }
}

// ============================================================================
// Cache stores
// ============================================================================

/// Cache store whose every operation fails with a transient storage error
#[derive(Default)]
pub struct FailingCacheStore {
    calls: AtomicUsize,
}

impl FailingCacheStore {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn fail<T>(&self) -> AppResult<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::storage("cache backend unreachable"))
    }
}

#[async_trait]
impl NutritionCacheStore for FailingCacheStore {
    async fn find_exact(&self, _food_name: &str) -> AppResult<Option<NutritionCacheEntry>> {
        self.fail()
    }

    async fn find_by_keywords(
        &self,
        _keywords: &BTreeSet<String>,
    ) -> AppResult<Vec<NutritionCacheEntry>> {
        self.fail()
    }

    async fn append(&self, _entry: NutritionCacheEntry) -> AppResult<()> {
        self.fail()
    }

    async fn entry_count(&self) -> AppResult<usize> {
        self.fail()
    }

    async fn health_check(&self) -> AppResult<()> {
        self.fail()
    }

    async fn clear_all(&self) -> AppResult<()> {
        self.fail()
    }
}

/// In-memory cache shared as a trait object and as its concrete type
pub fn memory_cache() -> (Arc<InMemoryNutritionCache>, Arc<dyn NutritionCacheStore>) {
    let cache = Arc::new(InMemoryNutritionCache::with_capacity(1000));
    let store: Arc<dyn NutritionCacheStore> = cache.clone();
    (cache, store)
}

// ============================================================================
// Databases and estimators
// ============================================================================

/// Nutrient database that is always unreachable
#[derive(Default)]
pub struct FailingDatabase {
    calls: AtomicUsize,
}

impl FailingDatabase {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionDatabase for FailingDatabase {
    fn name(&self) -> &'static str {
        "failing-db"
    }

    async fn lookup_per_100g(&self, _food_name: &str) -> AppResult<Option<NutritionInfo>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::external_unavailable("failing-db", "connection refused"))
    }
}

/// Estimator that always fails
#[derive(Default)]
pub struct FailingEstimator {
    calls: AtomicUsize,
}

impl FailingEstimator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionEstimator for FailingEstimator {
    fn name(&self) -> &'static str {
        "failing-estimator"
    }

    async fn estimate(&self, _food_name: &str, _weight_grams: f64) -> AppResult<NutritionInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(AppError::external_timeout("failing-estimator", 20))
    }
}

/// Estimator answering 1.5 kcal per gram for anything
#[derive(Default)]
pub struct FixedEstimator {
    calls: AtomicUsize,
}

impl FixedEstimator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl NutritionEstimator for FixedEstimator {
    fn name(&self) -> &'static str {
        "fixed-estimator"
    }

    async fn estimate(&self, _food_name: &str, weight_grams: f64) -> AppResult<NutritionInfo> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(NutritionInfo {
            calories: 1.5 * weight_grams,
            protein: 0.05 * weight_grams,
            ..NutritionInfo::zero(weight_grams)
        })
    }
}

// ============================================================================
// Polling
// ============================================================================

/// Wait until the store holds at least `count` entries, up to two seconds
pub async fn wait_for_entries(store: &dyn NutritionCacheStore, count: usize) -> bool {
    for _ in 0..200 {
        if store.entry_count().await.unwrap_or(0) >= count {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}
