// ABOUTME: Integration tests for food detection: remote vision, local classifier, and orchestration
// ABOUTME: Uses a scripted LLM provider and a fake classifier backend, no network or model files
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]

mod common;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use common::{
    apple_photo, init_test_logging, FakeClassifierBackend, ScriptedLlmProvider,
    APPLE_VISION_REPLY, CAR_VISION_REPLY, PLATE_VISION_REPLY,
};
use mealscan::config::DetectionThresholds;
use mealscan::errors::AnalysisError;
use mealscan::models::{DetectionRoute, DetectionSource, FoodCategory, MealType};
use mealscan::vision::{
    preprocess, DetectionOrchestrator, DetectionState, FailureKind, LocalClassifier,
    PreprocessedImage, RemoteVisionDetector,
};

fn photo() -> Result<PreprocessedImage> {
    Ok(preprocess(&apple_photo())?)
}

fn remote(provider: &Arc<ScriptedLlmProvider>) -> RemoteVisionDetector {
    RemoteVisionDetector::new(provider.clone())
}

fn local(backend: &Arc<FakeClassifierBackend>) -> LocalClassifier {
    LocalClassifier::new(backend.clone())
}

// ============================================================================
// Remote vision detector
// ============================================================================

#[tokio::test]
async fn test_remote_detects_plate_in_fenced_reply() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(PLATE_VISION_REPLY));
    let detection = remote(&provider).detect(&photo()?.payload).await?;

    assert!(!detection.degraded);
    assert_eq!(detection.classification.meal_type, MealType::ReadyMade);
    let names: Vec<&str> = detection.candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["grilled chicken breast", "white rice"]);
    assert_eq!(detection.candidates[0].category, FoodCategory::Protein);
    assert_eq!(detection.candidates[1].detector_rank, 1);
    assert_eq!(provider.vision_calls(), 1);
    Ok(())
}

#[tokio::test]
async fn test_remote_rejects_non_food() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(CAR_VISION_REPLY));
    let result = remote(&provider).detect(&photo()?.payload).await;

    assert_eq!(
        result,
        Err(AnalysisError::non_food("a red car parked on a street"))
    );
    Ok(())
}

#[tokio::test]
async fn test_remote_degrades_on_provider_error() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new());
    let detection = remote(&provider).detect(&photo()?.payload).await?;

    assert!(detection.degraded);
    assert_eq!(detection.candidates.len(), 1);
    assert_eq!(detection.candidates[0].name, "Mixed Food");
    assert_eq!(detection.candidates[0].source, DetectionSource::Fallback);
    Ok(())
}

#[tokio::test]
async fn test_remote_degrades_on_malformed_reply() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision("I see a sandwich!"));
    let detection = remote(&provider).detect(&photo()?.payload).await?;
    assert!(detection.degraded);

    let empty_foods = r#"{"contains_food": true, "meal_type": "mixed", "foods": []}"#;
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(empty_foods));
    let detection = remote(&provider).detect(&photo()?.payload).await?;
    assert!(detection.degraded);
    Ok(())
}

#[tokio::test]
async fn test_remote_degrades_on_timeout() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(
        ScriptedLlmProvider::new()
            .with_vision(APPLE_VISION_REPLY)
            .with_delay(Duration::from_millis(500)),
    );
    let detector = remote(&provider).with_timeout(Duration::from_millis(20));
    let detection = detector.detect(&photo()?.payload).await?;
    assert!(detection.degraded);
    Ok(())
}

// ============================================================================
// Local classifier
// ============================================================================

#[tokio::test]
async fn test_local_classifier_ranks_scores() -> Result<()> {
    init_test_logging();
    let backend = Arc::new(FakeClassifierBackend::with_scores(&[
        ("banana", 0.05),
        ("granny_smith", 0.6),
        ("Granny-Smith", 0.5),
        ("pizza", 0.3),
    ]));
    let classifier = local(&backend).with_default_weight(120.0);

    let candidates = classifier.classify(&photo()?.tensor).await;
    let names: Vec<&str> = candidates.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["granny smith", "pizza"]);
    assert!(candidates
        .iter()
        .all(|c| c.source == DetectionSource::Local && (c.estimated_weight_grams - 120.0).abs() < 1e-9));
    Ok(())
}

#[tokio::test]
async fn test_local_classifier_absorbs_failures() -> Result<()> {
    init_test_logging();
    let tensor = photo()?.tensor;

    let failing = Arc::new(FakeClassifierBackend::failing());
    assert!(local(&failing).classify(&tensor).await.is_empty());

    let unloaded = Arc::new(FakeClassifierBackend::unloaded());
    assert!(local(&unloaded).classify(&tensor).await.is_empty());
    assert_eq!(unloaded.predictions(), 0);

    let slow = Arc::new(FakeClassifierBackend::slow(Duration::from_millis(300)));
    let classifier = local(&slow).with_timeout(Duration::from_millis(20));
    assert!(classifier.classify(&tensor).await.is_empty());
    Ok(())
}

// ============================================================================
// Orchestrator
// ============================================================================

#[tokio::test]
async fn test_non_food_stops_before_local_inference() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(CAR_VISION_REPLY));
    let backend = Arc::new(FakeClassifierBackend::with_scores(&[("apple", 0.9)]));
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(remote(&provider))
        .with_local(local(&backend));

    let result = orchestrator.detect(&photo()?).await;
    assert!(matches!(result, Err(ref e) if e.is_non_food()));
    assert_eq!(backend.predictions(), 0);
    Ok(())
}

#[tokio::test]
async fn test_confident_local_results_are_trusted() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(PLATE_VISION_REPLY));
    let backend = Arc::new(FakeClassifierBackend::with_scores(&[
        ("chicken", 0.8),
        ("rice", 0.75),
    ]));
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(remote(&provider))
        .with_local(local(&backend));

    let outcome = orchestrator.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::LocalTrusted);
    assert_eq!(outcome.candidates.len(), 2);
    assert_eq!(outcome.classification.meal_type, MealType::ReadyMade);
    assert_eq!(
        outcome.trace,
        vec![
            DetectionState::NotStarted,
            DetectionState::Validating,
            DetectionState::Classifying,
            DetectionState::Merging,
            DetectionState::Done,
        ]
    );
    Ok(())
}

#[tokio::test]
async fn test_weak_local_results_are_merged() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(PLATE_VISION_REPLY));
    let backend = Arc::new(FakeClassifierBackend::with_scores(&[
        ("chicken", 0.65),
        ("broccoli", 0.2),
    ]));
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(remote(&provider))
        .with_local(local(&backend));

    let outcome = orchestrator.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::Merged);
    let names: Vec<&str> = outcome.candidates.iter().map(|c| c.name.as_str()).collect();
    // the remote chicken duplicates the kept local one
    assert_eq!(names, vec!["chicken", "white rice", "broccoli"]);
    Ok(())
}

#[tokio::test]
async fn test_remote_only_without_classifier() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new().with_vision(APPLE_VISION_REPLY));
    let orchestrator =
        DetectionOrchestrator::new(DetectionThresholds::default()).with_remote(remote(&provider));

    let outcome = orchestrator.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::RemoteOnly);
    assert_eq!(outcome.candidates[0].name, "apple");
    assert!(outcome.trace.contains(&DetectionState::AwaitingRemote));
    Ok(())
}

#[tokio::test]
async fn test_degraded_remote_falls_back_to_local() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new());
    let backend = Arc::new(FakeClassifierBackend::with_scores(&[("apple", 0.4)]));
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(remote(&provider))
        .with_local(local(&backend));

    let outcome = orchestrator.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::LocalOnly);
    assert_eq!(outcome.candidates[0].name, "apple");
    assert_eq!(outcome.classification.meal_type, MealType::Unknown);
    Ok(())
}

#[tokio::test]
async fn test_nothing_usable_yields_generic_item() -> Result<()> {
    init_test_logging();
    let provider = Arc::new(ScriptedLlmProvider::new());
    let backend = Arc::new(FakeClassifierBackend::failing());
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(remote(&provider))
        .with_local(local(&backend));

    let outcome = orchestrator.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::Fallback);
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].source, DetectionSource::Fallback);

    let bare = DetectionOrchestrator::default();
    let outcome = bare.detect(&photo()?).await?;
    assert_eq!(outcome.route, DetectionRoute::Fallback);
    assert!(!outcome.trace.contains(&DetectionState::Failed(FailureKind::NonFood)));
    Ok(())
}
