// ABOUTME: HTTP-level tests for the health, readiness, and meal analysis routes
// ABOUTME: Drives the full router with tower oneshot requests against scripted collaborators
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod common;

use std::sync::Arc;

use anyhow::Result;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use common::{
    apple_photo, init_test_logging, memory_cache, FailingCacheStore, ScriptedLlmProvider,
    APPLE_VISION_REPLY, CAR_VISION_REPLY, PLATE_VISION_REPLY,
};
use mealscan::analyzer::MealAnalyzer;
use mealscan::cache::NutritionCacheStore;
use mealscan::config::{DetectionThresholds, ServerConfig};
use mealscan::external::MockUsdaClient;
use mealscan::nutrition::NutritionResolver;
use mealscan::server::{build_router, ServerResources};
use mealscan::vision::{DetectionOrchestrator, RemoteVisionDetector};
use serde_json::Value;
use tower::ServiceExt;

fn app_with_store(vision_reply: Option<&str>, store: Arc<dyn NutritionCacheStore>) -> Router {
    let mut provider = ScriptedLlmProvider::new();
    if let Some(reply) = vision_reply {
        provider = provider.with_vision(reply);
    }
    let orchestrator = DetectionOrchestrator::new(DetectionThresholds::default())
        .with_remote(RemoteVisionDetector::new(Arc::new(provider)));
    let (resolver, _worker) = NutritionResolver::spawn(store, 16);
    let resolver = resolver.with_database(Arc::new(MockUsdaClient::new()));

    let resources = ServerResources::new(
        MealAnalyzer::new(orchestrator, resolver),
        Arc::new(ServerConfig::default()),
    );
    build_router(Arc::new(resources))
}

fn app(vision_reply: &str) -> Router {
    let (_cache, store) = memory_cache();
    app_with_store(Some(vision_reply), store)
}

fn analysis_request(uri: &str, body: Vec<u8>) -> Result<Request<Body>> {
    Ok(Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/octet-stream")
        .body(Body::from(body))?)
}

async fn json_body(response: axum::response::Response) -> Result<Value> {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
    Ok(serde_json::from_slice(&body)?)
}

// ============================================================================
// Health and readiness
// ============================================================================

#[tokio::test]
async fn test_health_reports_healthy() -> Result<()> {
    init_test_logging();
    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = app(APPLE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "mealscan");
    Ok(())
}

#[tokio::test]
async fn test_ready_with_healthy_cache() -> Result<()> {
    init_test_logging();
    let request = Request::builder().uri("/ready").body(Body::empty())?;
    let response = app(APPLE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["cache"]["status"], "ok");
    assert_eq!(body["breakers"]["nutrition_cache"], "closed");
    assert_eq!(body["breakers"]["nutrition_database"], "closed");
    Ok(())
}

#[tokio::test]
async fn test_ready_degraded_when_cache_down() -> Result<()> {
    init_test_logging();
    let store: Arc<dyn NutritionCacheStore> = Arc::new(FailingCacheStore::default());
    let app = app_with_store(Some(APPLE_VISION_REPLY), store);

    let request = Request::builder().uri("/ready").body(Body::empty())?;
    let response = app.oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await?;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["cache"]["status"], "unavailable");
    Ok(())
}

// ============================================================================
// Meal analysis
// ============================================================================

#[tokio::test]
async fn test_analysis_returns_meal_result() -> Result<()> {
    init_test_logging();
    let request = analysis_request("/api/meal-analysis", apple_photo())?;
    let response = app(APPLE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    let foods = body["detected_foods"].as_array().expect("detected_foods array");
    assert_eq!(foods.len(), 1);
    assert_eq!(foods[0]["name"], "apple");
    assert!(body["total_nutrition"]["calories"].as_f64().unwrap() > 90.0);
    assert_eq!(body["detection_route"], "remote_only");
    Ok(())
}

#[tokio::test]
async fn test_analysis_applies_query_weight_hints() -> Result<()> {
    init_test_logging();
    // weight_hints=[{"food_name":"rice","grams":200}]
    let uri = "/api/meal-analysis?weight_hints=%5B%7B%22food_name%22%3A%22rice%22%2C%22grams%22%3A200%7D%5D";
    let request = analysis_request(uri, apple_photo())?;
    let response = app(PLATE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await?;
    let rice = body["detected_foods"]
        .as_array()
        .and_then(|foods| foods.iter().find(|f| f["name"] == "white rice"))
        .expect("rice detected");
    assert_eq!(rice["estimated_weight_grams"].as_f64(), Some(200.0));
    Ok(())
}

#[tokio::test]
async fn test_non_food_photo_is_unprocessable() -> Result<()> {
    init_test_logging();
    let request = analysis_request("/api/meal-analysis", apple_photo())?;
    let response = app(CAR_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "NON_FOOD_IMAGE");
    assert_eq!(
        body["error"]["details"]["detected_content"],
        "a red car parked on a street"
    );
    Ok(())
}

#[tokio::test]
async fn test_garbage_body_is_bad_request() -> Result<()> {
    init_test_logging();
    let request = analysis_request("/api/meal-analysis", b"not an image".to_vec())?;
    let response = app(APPLE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "IMAGE_DECODE_FAILED");
    Ok(())
}

#[tokio::test]
async fn test_malformed_weight_hints_are_rejected() -> Result<()> {
    init_test_logging();
    let request = analysis_request(
        "/api/meal-analysis?weight_hints=rice%3D200",
        apple_photo(),
    )?;
    let response = app(APPLE_VISION_REPLY).oneshot(request).await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await?;
    assert_eq!(body["error"]["code"], "INVALID_INPUT");
    Ok(())
}

// ============================================================================
// Request IDs
// ============================================================================

#[tokio::test]
async fn test_request_id_is_assigned_and_echoed() -> Result<()> {
    init_test_logging();
    let app = app(APPLE_VISION_REPLY);

    let request = Request::builder().uri("/health").body(Body::empty())?;
    let response = app.clone().oneshot(request).await?;
    let assigned = response
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    assert!(assigned.starts_with("req_"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-abc-123")
        .body(Body::empty())?;
    let response = app.oneshot(request).await?;
    assert_eq!(
        response.headers().get("x-request-id").map(|v| v.as_bytes()),
        Some(b"trace-abc-123".as_slice())
    );
    Ok(())
}
