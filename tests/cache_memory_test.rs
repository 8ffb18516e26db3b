// ABOUTME: Unit tests for the in-memory nutrition cache
// ABOUTME: Tests exact and keyword lookups, newest-wins reads, LRU capacity, and clearing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
#![allow(missing_docs)]

use std::collections::BTreeSet;

use anyhow::Result;
use chrono::{Duration as ChronoDuration, Utc};
use mealscan::cache::{InMemoryNutritionCache, NutritionCacheStore};
use mealscan::models::{NutritionCacheEntry, NutritionInfo, NutritionSource};
use mealscan::nutrition::generate_search_keywords;

/// Helper: entry with `calories` per 100 g, aged `age_secs` seconds
fn entry(name: &str, calories: f64, age_secs: i64) -> NutritionCacheEntry {
    let nutrition = NutritionInfo {
        calories,
        ..NutritionInfo::zero(100.0)
    };
    let mut entry = NutritionCacheEntry::new(
        name,
        generate_search_keywords(name),
        &nutrition,
        NutritionSource::Authoritative,
    );
    entry.created_at = Utc::now() - ChronoDuration::seconds(age_secs);
    entry
}

fn keywords(words: &[&str]) -> BTreeSet<String> {
    words.iter().map(|w| (*w).to_owned()).collect()
}

#[tokio::test]
async fn test_exact_lookup_normalizes_name() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(100);
    cache.append(entry("Chicken Breast", 165.0, 0)).await?;

    let found = cache.find_exact("  chicken   BREAST ").await?;
    assert_eq!(found.map(|e| e.food_name), Some("chicken breast".to_owned()));
    assert!(cache.find_exact("chicken thigh").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_newest_entry_wins() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(100);
    cache.append(entry("rice", 110.0, 60)).await?;
    cache.append(entry("rice", 130.0, 0)).await?;

    let found = cache.find_exact("rice").await?;
    let calories = found.map(|e| e.nutrition_per_100g.calories);
    assert!(matches!(calories, Some(c) if (c - 130.0).abs() < 1e-9));
    assert_eq!(cache.entry_count().await?, 2, "appends never overwrite");
    Ok(())
}

#[tokio::test]
async fn test_keyword_lookup_orders_newest_first() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(100);
    cache.append(entry("grilled chicken breast", 165.0, 30)).await?;
    cache.append(entry("chicken soup", 40.0, 0)).await?;
    cache.append(entry("apple", 52.0, 0)).await?;

    let found = cache.find_by_keywords(&keywords(&["chicken"])).await?;
    let names: Vec<&str> = found.iter().map(|e| e.food_name.as_str()).collect();
    assert_eq!(names, vec!["chicken soup", "grilled chicken breast"]);

    let none = cache.find_by_keywords(&keywords(&["pizza"])).await?;
    assert!(none.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_capacity_evicts_least_recent() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(2);
    cache.append(entry("apple", 52.0, 0)).await?;
    cache.append(entry("banana", 89.0, 0)).await?;
    cache.append(entry("cherry", 50.0, 0)).await?;

    assert_eq!(cache.entry_count().await?, 2);
    assert!(cache.find_exact("apple").await?.is_none());
    assert!(cache
        .find_by_keywords(&keywords(&["apple"]))
        .await?
        .is_empty());
    assert!(cache.find_exact("cherry").await?.is_some());
    Ok(())
}

#[tokio::test]
async fn test_clear_all_and_health() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(10);
    cache.append(entry("apple", 52.0, 0)).await?;
    cache.health_check().await?;

    cache.clear_all().await?;
    assert_eq!(cache.entry_count().await?, 0);
    assert!(cache.find_exact("apple").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_entries_store_per_100g() -> Result<()> {
    let cache = InMemoryNutritionCache::with_capacity(10);
    let serving = NutritionInfo {
        calories: 330.0,
        ..NutritionInfo::zero(200.0)
    };
    cache
        .append(NutritionCacheEntry::new(
            "pasta",
            generate_search_keywords("pasta"),
            &serving,
            NutritionSource::GenerativeBackfill,
        ))
        .await?;

    let found = cache.find_exact("pasta").await?;
    let per_100g = found.map(|e| e.nutrition_for(100.0).calories);
    assert!(matches!(per_100g, Some(c) if (c - 165.0).abs() < 1e-9));
    Ok(())
}
