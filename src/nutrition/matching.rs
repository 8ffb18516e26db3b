// ABOUTME: Fuzzy food-name matching for cache lookups and weight hints
// ABOUTME: Exact/substring/Jaccard similarity, search keyword generation, and best-candidate selection
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::{BTreeSet, HashSet};

use crate::config::MatchingConfig;
use crate::constants::keywords::SEARCH_SYNONYMS;
use crate::constants::matching::{EXACT_MATCH_SCORE, MIN_KEYWORD_LEN};
use crate::models::NutritionCacheEntry;

fn word_set(normalized: &str) -> HashSet<&str> {
    normalized.split(' ').filter(|w| !w.is_empty()).collect()
}

/// Similarity of two food names in `[0, 1]`
///
/// 1.0 for equal normalized names, `substring_score` when one contains the
/// other, otherwise the Jaccard index of their word sets.
#[must_use]
pub fn similarity(a: &str, b: &str, substring_score: f64) -> f64 {
    let a = NutritionCacheEntry::normalize_name(a);
    let b = NutritionCacheEntry::normalize_name(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if a == b {
        return EXACT_MATCH_SCORE;
    }
    if a.contains(&b) || b.contains(&a) {
        return substring_score;
    }

    let words_a = word_set(&a);
    let words_b = word_set(&b);
    let union = words_a.union(&words_b).count();
    if union == 0 {
        return 0.0;
    }
    words_a.intersection(&words_b).count() as f64 / union as f64
}

/// Keywords indexing a food name in the nutrition cache
///
/// The full normalized name, every word longer than two characters, and
/// curated synonyms for any of those words.
#[must_use]
pub fn generate_search_keywords(food_name: &str) -> BTreeSet<String> {
    let normalized = NutritionCacheEntry::normalize_name(food_name);
    let mut keywords = BTreeSet::new();
    if normalized.is_empty() {
        return keywords;
    }

    let words: Vec<String> = normalized
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| w.chars().count() > MIN_KEYWORD_LEN)
        .map(str::to_owned)
        .collect();

    for (term, synonyms) in SEARCH_SYNONYMS {
        if words.iter().any(|w| w == term) {
            keywords.extend(synonyms.iter().map(|s| (*s).to_owned()));
        }
    }
    keywords.extend(words);
    keywords.insert(normalized);
    keywords
}

/// Pick the cache entry most similar to `food_name`
///
/// The best score must be strictly above the accept threshold. Equal scores
/// go to the newest entry.
#[must_use]
pub fn best_cache_match<'a>(
    food_name: &str,
    entries: &'a [NutritionCacheEntry],
    config: &MatchingConfig,
) -> Option<(&'a NutritionCacheEntry, f64)> {
    entries
        .iter()
        .map(|entry| {
            (
                entry,
                similarity(food_name, &entry.food_name, config.substring_score),
            )
        })
        .filter(|(_, score)| *score > config.accept_threshold)
        .max_by(|(a, score_a), (b, score_b)| {
            score_a
                .total_cmp(score_b)
                .then(a.created_at.cmp(&b.created_at))
        })
}

/// Index of the name best matching `target`, if any scores above the threshold
#[must_use]
pub fn best_name_match<'a, I>(target: &str, names: I, config: &MatchingConfig) -> Option<usize>
where
    I: IntoIterator<Item = &'a str>,
{
    names
        .into_iter()
        .enumerate()
        .map(|(index, name)| (index, similarity(target, name, config.substring_score)))
        .filter(|(_, score)| *score > config.accept_threshold)
        // first index wins ties: max_by keeps the last maximum, so compare reversed index
        .max_by(|(ia, a), (ib, b)| a.total_cmp(b).then(ib.cmp(ia)))
        .map(|(index, _)| index)
}
