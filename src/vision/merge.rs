// ABOUTME: Confidence-gated merge of local classifier and remote vision candidates
// ABOUTME: Duplicate detection by substring containment or shared-token overlap, with deterministic backfill
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::HashSet;

use crate::config::DetectionThresholds;
use crate::models::FoodCandidate;

fn tokens(name: &str) -> HashSet<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// Whether two detected names refer to the same food
///
/// True when either lowercase name contains the other, or when the shared
/// words make up at least `token_overlap` of either name's word count.
#[must_use]
pub fn names_overlap(a: &str, b: &str, token_overlap: f64) -> bool {
    let lower_a = a.trim().to_lowercase();
    let lower_b = b.trim().to_lowercase();
    if lower_a.is_empty() || lower_b.is_empty() {
        return false;
    }
    if lower_a.contains(&lower_b) || lower_b.contains(&lower_a) {
        return true;
    }

    let tokens_a = tokens(&lower_a);
    let tokens_b = tokens(&lower_b);
    if tokens_a.is_empty() || tokens_b.is_empty() {
        return false;
    }
    let shared = tokens_a.intersection(&tokens_b).count() as f64;
    shared / tokens_a.len() as f64 >= token_overlap
        || shared / tokens_b.len() as f64 >= token_overlap
}

/// Arithmetic mean of candidate confidences, 0 for an empty slice
#[must_use]
pub fn mean_confidence(candidates: &[FoodCandidate]) -> f64 {
    if candidates.is_empty() {
        return 0.0;
    }
    candidates.iter().map(|c| c.confidence).sum::<f64>() / candidates.len() as f64
}

/// Merge local and remote candidates when local results are not trusted outright
///
/// 1. Local candidates at or above the keep threshold survive verbatim.
/// 2. Remote candidates that duplicate a kept local one are dropped; the rest
///    follow in remote order.
/// 3. Below `merge_min_items`, leftover local candidates (confidence
///    descending, then original rank) that duplicate nothing already present
///    are appended until `merge_max_items`.
#[must_use]
pub fn merge_candidates(
    local: &[FoodCandidate],
    remote: &[FoodCandidate],
    thresholds: &DetectionThresholds,
) -> Vec<FoodCandidate> {
    let overlap = thresholds.dedup_token_overlap;
    let (kept, mut leftovers): (Vec<&FoodCandidate>, Vec<&FoodCandidate>) = local
        .iter()
        .partition(|c| c.confidence >= thresholds.local_keep_threshold);

    let mut merged: Vec<FoodCandidate> = kept.iter().map(|c| (*c).clone()).collect();
    merged.extend(
        remote
            .iter()
            .filter(|r| !kept.iter().any(|k| names_overlap(&k.name, &r.name, overlap)))
            .cloned(),
    );

    if merged.len() < thresholds.merge_min_items {
        // sort_by is stable; rank breaks confidence ties explicitly anyway
        leftovers.sort_by(|a, b| {
            b.confidence
                .total_cmp(&a.confidence)
                .then(a.detector_rank.cmp(&b.detector_rank))
        });
        for candidate in leftovers {
            if merged.len() >= thresholds.merge_max_items {
                break;
            }
            if !merged
                .iter()
                .any(|m| names_overlap(&m.name, &candidate.name, overlap))
            {
                merged.push(candidate.clone());
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_overlap_rules() {
        assert!(names_overlap("chicken breast", "grilled chicken breast", 0.5));
        assert!(names_overlap("Rice", "fried rice", 0.5));
        assert!(names_overlap("green salad", "salad greens mix", 0.5));
        assert!(!names_overlap("apple", "banana", 0.5));
        assert!(!names_overlap("", "banana", 0.5));
    }

    #[test]
    fn test_mean_confidence_handles_empty() {
        assert!(mean_confidence(&[]).abs() < f64::EPSILON);
    }
}
