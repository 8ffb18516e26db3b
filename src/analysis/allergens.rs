// ABOUTME: Allergen detection over food names using a static keyword table
// ABOUTME: Reports nuts, dairy, gluten, shellfish, eggs and soy categories
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeSet;

use mealscan_core::text::NameTokens;

use crate::constants::keywords::{ALLERGEN_KEYWORDS, NON_DAIRY_PHRASES};
use crate::models::DetectedFoodItem;

/// Allergen categories triggered by any of `names`
///
/// Keywords match whole words, so "eggplant" is not eggs and
/// "peanut butter" is nuts but not dairy.
#[must_use]
pub fn allergens_in_names<'a, I>(names: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a str>,
{
    let tokens: Vec<NameTokens> = names.into_iter().map(NameTokens::new).collect();
    let dairy_tokens: Vec<NameTokens> = tokens
        .iter()
        .map(|words| words.without(NON_DAIRY_PHRASES))
        .collect();
    ALLERGEN_KEYWORDS
        .iter()
        .filter(|(category, keywords)| {
            let names = if *category == "dairy" {
                &dairy_tokens
            } else {
                &tokens
            };
            names.iter().any(|words| words.mentions_any(keywords))
        })
        .map(|(category, _)| (*category).to_owned())
        .collect()
}

/// Allergen categories triggered by item names and their alternative names
#[must_use]
pub fn detect_allergens(items: &[DetectedFoodItem]) -> BTreeSet<String> {
    allergens_in_names(items.iter().flat_map(|item| {
        std::iter::once(item.name.as_str()).chain(item.alternative_names.iter().map(String::as_str))
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allergens_from_names() {
        let found = allergens_in_names(["Peanut Butter Toast", "scrambled egg"]);
        assert!(found.contains("nuts"));
        assert!(found.contains("gluten"));
        assert!(found.contains("eggs"));
        assert!(!found.contains("dairy"));
        assert!(!found.contains("shellfish"));

        let latte = allergens_in_names(["Cafe Latte", "butter croissant"]);
        assert!(latte.contains("dairy"));
        assert!(latte.contains("gluten"));
    }

    #[test]
    fn test_partial_words_do_not_trigger_allergens() {
        assert!(allergens_in_names(["grilled eggplant"]).is_empty());
        assert!(allergens_in_names(["butternut squash soup"]).is_empty());
        assert!(allergens_in_names(["boiled carrots", "asparagus spears"]).is_empty());

        let almond_milk = allergens_in_names(["almond milk"]);
        assert!(almond_milk.contains("nuts"));
        assert!(!almond_milk.contains("dairy"));
    }

    #[test]
    fn test_no_allergens_for_plain_fruit() {
        assert!(allergens_in_names(["apple", "banana"]).is_empty());
    }
}
