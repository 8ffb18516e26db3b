// ABOUTME: Tests for food-name matching used by the cache tier and the detection merge
// ABOUTME: Covers cache candidate selection, keyword generation, and confidence-gated merging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]

use chrono::{Duration as ChronoDuration, Utc};
use mealscan::config::{DetectionThresholds, MatchingConfig};
use mealscan::models::{
    DetectionSource, FoodCandidate, NutritionCacheEntry, NutritionInfo, NutritionSource,
};
use mealscan::nutrition::{best_cache_match, generate_search_keywords, similarity};
use mealscan::vision::{mean_confidence, merge_candidates, names_overlap};

fn cached(name: &str, calories: f64, age_secs: i64) -> NutritionCacheEntry {
    let mut entry = NutritionCacheEntry::new(
        name,
        generate_search_keywords(name),
        &NutritionInfo {
            calories,
            ..NutritionInfo::zero(100.0)
        },
        NutritionSource::Authoritative,
    );
    entry.created_at = Utc::now() - ChronoDuration::seconds(age_secs);
    entry
}

fn local(name: &str, confidence: f64, rank: usize) -> FoodCandidate {
    FoodCandidate::new(name, confidence, 100.0, DetectionSource::Local, rank)
}

fn remote(name: &str, confidence: f64, rank: usize) -> FoodCandidate {
    FoodCandidate::new(name, confidence, 150.0, DetectionSource::Remote, rank)
}

fn names(candidates: &[FoodCandidate]) -> Vec<&str> {
    candidates.iter().map(|c| c.name.as_str()).collect()
}

// ============================================================================
// Cache matching
// ============================================================================

#[test]
fn test_substring_match_is_accepted() {
    let config = MatchingConfig::default();
    let entries = vec![cached("chicken breast", 165.0, 0), cached("apple", 52.0, 0)];

    let best = best_cache_match("grilled chicken breast", &entries, &config);
    assert!(matches!(best, Some((entry, score))
        if entry.food_name == "chicken breast" && (score - 0.8).abs() < 1e-9));
}

#[test]
fn test_threshold_is_strict() {
    // {chicken, rice} vs {chicken, soup}: jaccard 1/3, below 0.6
    let config = MatchingConfig::default();
    let entries = vec![cached("chicken soup", 40.0, 0)];
    assert!(best_cache_match("chicken rice", &entries, &config).is_none());

    let exactly_at = MatchingConfig {
        accept_threshold: 0.8,
        ..MatchingConfig::default()
    };
    let entries = vec![cached("chicken breast", 165.0, 0)];
    assert!(
        best_cache_match("grilled chicken breast", &entries, &exactly_at).is_none(),
        "a score equal to the threshold is rejected"
    );
}

#[test]
fn test_equal_scores_prefer_newest() {
    let config = MatchingConfig::default();
    let entries = vec![cached("rice", 110.0, 120), cached("rice", 130.0, 5)];

    let best = best_cache_match("rice", &entries, &config);
    assert!(matches!(best, Some((entry, _))
        if (entry.nutrition_per_100g.calories - 130.0).abs() < 1e-9));
}

#[test]
fn test_similarity_is_symmetric() {
    for (a, b) in [
        ("brown rice", "rice pilaf"),
        ("chicken breast", "grilled chicken breast"),
        ("Apple", "apple"),
    ] {
        assert!((similarity(a, b, 0.8) - similarity(b, a, 0.8)).abs() < 1e-12);
    }
}

#[test]
fn test_keywords_for_blank_name_are_empty() {
    assert!(generate_search_keywords("   ").is_empty());
}

// ============================================================================
// Detection merge
// ============================================================================

#[test]
fn test_merge_keeps_confident_local_and_drops_remote_duplicates() {
    let thresholds = DetectionThresholds::default();
    let local = vec![local("pizza", 0.65, 0), local("garlic bread", 0.2, 1)];
    let remote = vec![remote("pepperoni pizza", 0.9, 0), remote("caesar salad", 0.8, 1)];

    let merged = merge_candidates(&local, &remote, &thresholds);
    assert_eq!(names(&merged), vec!["pizza", "caesar salad", "garlic bread"]);
    assert_eq!(merged[0].source, DetectionSource::Local);
}

#[test]
fn test_merge_backfill_orders_by_confidence_then_rank() {
    let thresholds = DetectionThresholds::default();
    let local = vec![
        local("banana", 0.3, 0),
        local("orange", 0.4, 1),
        local("grape", 0.3, 2),
    ];
    let remote = vec![remote("yogurt", 0.9, 0)];

    let merged = merge_candidates(&local, &remote, &thresholds);
    assert_eq!(names(&merged), vec!["yogurt", "orange", "banana", "grape"]);
}

#[test]
fn test_merge_backfill_stops_at_max_items() {
    let thresholds = DetectionThresholds {
        merge_min_items: 3,
        merge_max_items: 3,
        ..DetectionThresholds::default()
    };
    let local = vec![local("banana", 0.3, 0), local("orange", 0.2, 1)];
    let remote = vec![remote("yogurt", 0.9, 0), remote("granola", 0.8, 1)];

    let merged = merge_candidates(&local, &remote, &thresholds);
    assert_eq!(names(&merged), vec!["yogurt", "granola", "banana"]);
}

#[test]
fn test_merge_without_backfill_when_enough_items() {
    let thresholds = DetectionThresholds::default();
    let local = vec![local("toast", 0.2, 0)];
    let remote = vec![
        remote("eggs", 0.9, 0),
        remote("bacon", 0.8, 1),
        remote("coffee", 0.7, 2),
    ];

    let merged = merge_candidates(&local, &remote, &thresholds);
    assert_eq!(names(&merged), vec!["eggs", "bacon", "coffee"]);
}

#[test]
fn test_backfill_skips_local_duplicates_of_remote() {
    let thresholds = DetectionThresholds::default();
    let local = vec![local("fried rice", 0.4, 0), local("broccoli", 0.3, 1)];
    let remote = vec![remote("rice", 0.9, 0)];

    let merged = merge_candidates(&local, &remote, &thresholds);
    assert_eq!(names(&merged), vec!["rice", "broccoli"]);
}

#[test]
fn test_overlap_and_mean_confidence() {
    assert!(names_overlap("Chicken Breast", "chicken", 0.5));
    assert!(!names_overlap("beef stew", "apple pie", 0.5));

    let candidates = vec![local("a", 0.6, 0), local("b", 0.8, 1)];
    assert!((mean_confidence(&candidates) - 0.7).abs() < 1e-9);
}

#[test]
fn test_merge_keeps_one_chicken_breast() {
    let thresholds = DetectionThresholds::default();
    let local = vec![local("chicken breast", 0.65, 0)];
    let remote = vec![remote("grilled chicken breast", 0.9, 0)];

    let merged = merge_candidates(&local, &remote, &thresholds);
    let chicken = merged.iter().filter(|c| c.name.contains("chicken")).count();
    assert_eq!(chicken, 1);
}
