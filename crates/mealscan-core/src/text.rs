// ABOUTME: Word-level keyword matching over food names
// ABOUTME: Keywords match whole words or their plurals, never fragments of longer words
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Keyword matching for category inference and allergen scanning
//!
//! "egg" matches "egg" and "eggs" but not "eggplant"; "oil" does not match
//! "boiled". Multi-word keywords match consecutive words.

/// Lowercased words of a food name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameTokens {
    words: Vec<String>,
}

/// `word` is `keyword` or a regular plural of it
fn word_matches(word: &str, keyword: &str) -> bool {
    let Some(rest) = word.strip_prefix(keyword) else {
        return keyword
            .strip_suffix('y')
            .and_then(|stem| word.strip_prefix(stem))
            .is_some_and(|rest| rest == "ies");
    };
    matches!(rest, "" | "s" | "es")
}

impl NameTokens {
    /// Split `name` on anything that is not a letter or digit
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            words: name
                .split(|c: char| !c.is_alphanumeric())
                .filter(|w| !w.is_empty())
                .map(str::to_lowercase)
                .collect(),
        }
    }

    fn spans<'a>(&'a self, keyword: &'a str) -> impl Iterator<Item = std::ops::Range<usize>> + 'a {
        let wanted: Vec<&str> = keyword.split_whitespace().collect();
        let len = wanted.len();
        (0..self.words.len().saturating_sub(len.saturating_sub(1)))
            .filter(move |&start| {
                len > 0
                    && wanted
                        .iter()
                        .zip(&self.words[start..start + len])
                        .all(|(k, w)| word_matches(w, k))
            })
            .map(move |start| start..start + len)
    }

    /// Whether `keyword` occurs as whole words
    #[must_use]
    pub fn mentions(&self, keyword: &str) -> bool {
        self.spans(keyword).next().is_some()
    }

    /// Whether any of `keywords` occurs
    #[must_use]
    pub fn mentions_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|keyword| self.mentions(keyword))
    }

    /// Copy with every occurrence of `phrases` blanked out
    ///
    /// Used so that "peanut butter" cannot count as butter.
    #[must_use]
    pub fn without(&self, phrases: &[&str]) -> Self {
        let mut words = self.words.clone();
        for phrase in phrases {
            for span in self.spans(phrase) {
                for word in &mut words[span] {
                    word.clear();
                }
            }
        }
        Self { words }
    }
}
