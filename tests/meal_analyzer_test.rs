// ABOUTME: End-to-end tests for the meal analyzer facade
// ABOUTME: Photo in, aggregated nutrition out, with the non-food gate and decode errors surfaced
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]

mod common;

use std::sync::Arc;

use anyhow::Result;
use common::{
    apple_photo, init_test_logging, memory_cache, ScriptedLlmProvider, APPLE_ESTIMATE_REPLY,
    APPLE_VISION_REPLY, CAR_VISION_REPLY, PLATE_VISION_REPLY,
};
use mealscan::analyzer::{apply_weight_options, AnalysisOptions, MealAnalyzer};
use mealscan::cache::NutritionCacheStore;
use mealscan::config::{DetectionThresholds, MatchingConfig};
use mealscan::errors::AnalysisError;
use mealscan::external::MockUsdaClient;
use mealscan::models::{
    DetectionRoute, DetectionSource, FoodCandidate, FoodCategory, MealType, NutritionTier,
};
use mealscan::nutrition::{LlmNutritionEstimator, NutritionResolver};
use mealscan::vision::{DetectionOrchestrator, RemoteVisionDetector};

struct Harness {
    analyzer: MealAnalyzer,
    provider: Arc<ScriptedLlmProvider>,
    usda: Arc<MockUsdaClient>,
    store: Arc<dyn NutritionCacheStore>,
}

fn harness(provider: ScriptedLlmProvider) -> Harness {
    let provider = Arc::new(provider);
    let usda = Arc::new(MockUsdaClient::new());
    let (_cache, store) = memory_cache();

    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(RemoteVisionDetector::new(provider.clone()));
    let (resolver, _worker) = NutritionResolver::spawn(store.clone(), 16);
    let resolver = resolver
        .with_database(usda.clone())
        .with_estimator(Arc::new(LlmNutritionEstimator::new(provider.clone())));

    Harness {
        analyzer: MealAnalyzer::new(orchestrator, resolver),
        provider,
        usda,
        store,
    }
}

fn close(actual: f64, expected: f64) -> bool {
    (actual - expected).abs() < 1e-6
}

#[tokio::test]
async fn test_apple_photo_end_to_end() -> Result<()> {
    init_test_logging();
    let h = harness(ScriptedLlmProvider::new().with_vision(APPLE_VISION_REPLY));

    let result = h
        .analyzer
        .analyze(&apple_photo(), &AnalysisOptions::default())
        .await?;

    assert_eq!(result.detected_foods.len(), 1);
    let apple = &result.detected_foods[0];
    assert_eq!(apple.name, "apple");
    assert_eq!(apple.category, FoodCategory::Fruits);
    assert!(close(apple.nutrition.calories, 52.0 * 1.82));
    assert!(close(result.total_nutrition.calories, apple.nutrition.calories));
    assert!(close(result.total_nutrition.serving_size_grams, 182.0));
    assert_eq!(result.primary_food_category, FoodCategory::Fruits);
    assert!(close(result.confidence_score, 0.9));
    assert!(result.allergen_warnings.is_empty());
    assert_eq!(result.meal_type, MealType::Ingredients);
    assert_eq!(result.detection_route, DetectionRoute::RemoteOnly);
    assert_eq!(result.nutrition_sources, vec![NutritionTier::Authoritative]);
    assert_eq!(h.usda.lookup_count(), 1);
    Ok(())
}

#[tokio::test]
async fn test_non_food_photo_is_rejected_without_lookups() -> Result<()> {
    init_test_logging();
    let h = harness(
        ScriptedLlmProvider::new()
            .with_vision(CAR_VISION_REPLY)
            .with_estimate(APPLE_ESTIMATE_REPLY),
    );

    let result = h
        .analyzer
        .analyze(&apple_photo(), &AnalysisOptions::default())
        .await;

    assert_eq!(
        result,
        Err(AnalysisError::non_food("a red car parked on a street"))
    );
    assert_eq!(h.usda.lookup_count(), 0);
    assert_eq!(h.provider.estimate_calls(), 0);
    assert_eq!(h.store.entry_count().await?, 0);
    Ok(())
}

#[tokio::test]
async fn test_undecodable_bytes_fail_before_detection() -> Result<()> {
    init_test_logging();
    let h = harness(ScriptedLlmProvider::new().with_vision(APPLE_VISION_REPLY));

    let result = h
        .analyzer
        .analyze(b"definitely not an image", &AnalysisOptions::default())
        .await;

    assert!(matches!(result, Err(AnalysisError::Decode { .. })));
    assert_eq!(h.provider.vision_calls(), 0);

    let empty = h.analyzer.analyze(&[], &AnalysisOptions::default()).await;
    assert!(matches!(empty, Err(AnalysisError::Decode { .. })));
    Ok(())
}

#[tokio::test]
async fn test_plate_mixes_tiers_and_applies_hints() -> Result<()> {
    init_test_logging();
    let h = harness(
        ScriptedLlmProvider::new()
            .with_vision(PLATE_VISION_REPLY)
            .with_estimate(APPLE_ESTIMATE_REPLY),
    );
    let options = AnalysisOptions::default().with_hint("rice", 200.0);

    let result = h.analyzer.analyze(&apple_photo(), &options).await?;

    let names: Vec<&str> = result.detected_foods.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["grilled chicken breast", "white rice"]);
    assert_eq!(
        result.nutrition_sources,
        vec![NutritionTier::Generative, NutritionTier::Authoritative]
    );

    let rice = &result.detected_foods[1];
    assert!(close(rice.estimated_weight_grams, 200.0));
    assert!(close(rice.nutrition.calories, 260.0));
    assert!(close(result.total_nutrition.calories, 95.0 + 260.0));
    assert!(close(result.total_nutrition.serving_size_grams, 350.0));
    assert_eq!(result.meal_type, MealType::ReadyMade);
    assert_eq!(result.primary_food_category, FoodCategory::Protein);
    Ok(())
}

#[tokio::test]
async fn test_allergens_are_flagged() -> Result<()> {
    init_test_logging();
    let reply = r#"{
      "contains_food": true,
      "meal_type": "ready_made",
      "meal_type_confidence": 0.7,
      "foods": [
        {"name": "bagel", "estimated_weight": 90, "confidence": 0.8},
        {"name": "cream cheese", "estimated_weight": 30, "confidence": 0.6}
      ]
    }"#;
    let h = harness(ScriptedLlmProvider::new().with_vision(reply));

    let result = h
        .analyzer
        .analyze(&apple_photo(), &AnalysisOptions::default())
        .await?;

    let allergens: Vec<&str> = result.allergen_warnings.iter().map(String::as_str).collect();
    assert_eq!(allergens, vec!["dairy", "gluten"]);
    // nothing in the database or cache, no estimate configured
    assert!(result
        .nutrition_sources
        .iter()
        .all(|tier| *tier == NutritionTier::Heuristic));
    assert!(close(result.total_nutrition.calories, 2.0 * 120.0));
    Ok(())
}

#[tokio::test]
async fn test_provider_outage_still_produces_result() -> Result<()> {
    init_test_logging();
    let h = harness(ScriptedLlmProvider::new());

    let result = h
        .analyzer
        .analyze(&apple_photo(), &AnalysisOptions::default().with_default_weight(200.0))
        .await?;

    assert_eq!(result.detection_route, DetectionRoute::Fallback);
    assert_eq!(result.detected_foods.len(), 1);
    assert_eq!(result.nutrition_sources, vec![NutritionTier::Heuristic]);
    // the placeholder keeps its own 150 g portion
    assert!(close(result.total_nutrition.calories, 300.0));
    Ok(())
}

#[test]
fn test_weight_options_target_local_and_hinted_items() {
    let candidates = vec![
        FoodCandidate::new("pizza", 0.8, 100.0, DetectionSource::Local, 0),
        FoodCandidate::new("caesar salad", 0.7, 180.0, DetectionSource::Remote, 0),
        FoodCandidate::new("garlic bread", 0.6, 60.0, DetectionSource::Remote, 1),
    ];
    let options = AnalysisOptions::default()
        .with_default_weight(250.0)
        .with_hint("salad", 120.0)
        .with_hint("bread", -10.0);

    let adjusted = apply_weight_options(candidates, &options, &MatchingConfig::default());
    let weights: Vec<f64> = adjusted.iter().map(|c| c.estimated_weight_grams).collect();
    assert_eq!(weights, vec![250.0, 120.0, 60.0]);
}
