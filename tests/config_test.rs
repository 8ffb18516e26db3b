// ABOUTME: Tests for environment-driven pipeline and server configuration
// ABOUTME: Verifies defaults, overrides, unparseable values, and validation failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]

use std::env;

use mealscan::config::{
    DetectionThresholds, LlmProviderType, MatchingConfig, PipelineConfig, ServerConfig,
};
use mealscan::errors::ErrorCode;
use serial_test::serial;

const PIPELINE_VARS: &[&str] = &[
    "MEALSCAN_LOCAL_TRUST_THRESHOLD",
    "MEALSCAN_MERGE_MIN_ITEMS",
    "MEALSCAN_MERGE_MAX_ITEMS",
    "MEALSCAN_DEFAULT_WEIGHT_GRAMS",
    "MEALSCAN_MATCH_ACCEPT_THRESHOLD",
    "MEALSCAN_LLM_PROVIDER",
    "MEALSCAN_MAX_PAYLOAD_DIMENSION",
];

fn clear_pipeline_env() {
    for var in PIPELINE_VARS {
        env::remove_var(var);
    }
}

#[test]
fn test_defaults() {
    let detection = DetectionThresholds::default();
    assert!((detection.local_trust_threshold - 0.7).abs() < f64::EPSILON);
    assert!((detection.local_keep_threshold - 0.6).abs() < f64::EPSILON);
    assert_eq!(detection.classifier_top_k, 5);
    assert_eq!(detection.merge_min_items, 3);
    assert_eq!(detection.merge_max_items, 5);

    let matching = MatchingConfig::default();
    assert!((matching.accept_threshold - 0.6).abs() < f64::EPSILON);
    assert!((matching.substring_score - 0.8).abs() < f64::EPSILON);

    let pipeline = PipelineConfig::default();
    assert!((pipeline.default_weight_grams - 100.0).abs() < f64::EPSILON);
    assert_eq!(pipeline.max_payload_dimension, None);
    assert!(pipeline.validate().is_ok());
}

#[test]
#[serial]
fn test_environment_overrides() {
    clear_pipeline_env();
    env::set_var("MEALSCAN_LOCAL_TRUST_THRESHOLD", "0.85");
    env::set_var("MEALSCAN_MERGE_MAX_ITEMS", "8");
    env::set_var("MEALSCAN_DEFAULT_WEIGHT_GRAMS", "120");

    let config = PipelineConfig::from_env();
    assert!((config.detection.local_trust_threshold - 0.85).abs() < f64::EPSILON);
    assert_eq!(config.detection.merge_max_items, 8);
    assert!((config.default_weight_grams - 120.0).abs() < f64::EPSILON);
    assert!(config.validate().is_ok());

    clear_pipeline_env();
}

#[test]
#[serial]
fn test_payload_dimension_limit_is_opt_in() {
    clear_pipeline_env();
    assert_eq!(PipelineConfig::from_env().max_payload_dimension, None);

    env::set_var("MEALSCAN_MAX_PAYLOAD_DIMENSION", "2048");
    assert_eq!(PipelineConfig::from_env().max_payload_dimension, Some(2048));

    env::set_var("MEALSCAN_MAX_PAYLOAD_DIMENSION", "0");
    assert_eq!(PipelineConfig::from_env().max_payload_dimension, None);

    clear_pipeline_env();
}

#[test]
#[serial]
fn test_unparseable_values_fall_back_to_defaults() {
    clear_pipeline_env();
    env::set_var("MEALSCAN_MERGE_MIN_ITEMS", "three");
    env::set_var("MEALSCAN_MATCH_ACCEPT_THRESHOLD", "");

    let config = PipelineConfig::from_env();
    assert_eq!(config.detection.merge_min_items, 3);
    assert!((config.matching.accept_threshold - 0.6).abs() < f64::EPSILON);

    clear_pipeline_env();
}

#[test]
fn test_validation_rejects_inconsistent_settings() {
    let mut config = PipelineConfig::default();
    config.detection.merge_min_items = 6;
    let err = config.validate().err();
    assert!(matches!(err, Some(ref e) if e.code == ErrorCode::ConfigInvalid));

    let mut config = PipelineConfig::default();
    config.matching.accept_threshold = 1.5;
    assert!(config.validate().is_err());

    let mut config = PipelineConfig::default();
    config.default_weight_grams = 0.0;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_server_config_rejects_invalid_pipeline() {
    clear_pipeline_env();
    env::set_var("MEALSCAN_MERGE_MIN_ITEMS", "9");

    let result = ServerConfig::from_env();
    assert!(matches!(result, Err(ref e) if e.code == ErrorCode::ConfigInvalid));

    clear_pipeline_env();
}

#[test]
#[serial]
fn test_llm_provider_selection() {
    clear_pipeline_env();
    assert_eq!(LlmProviderType::from_env(), LlmProviderType::Gemini);

    env::set_var("MEALSCAN_LLM_PROVIDER", "ollama");
    assert_eq!(LlmProviderType::from_env(), LlmProviderType::Local);
    assert_eq!(LlmProviderType::Local.to_string(), "local");

    clear_pipeline_env();
}
