// ABOUTME: Prompt templates for LLM interactions loaded at compile time
// ABOUTME: Meal vision detection and per-weight nutrition estimation instructions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Prompts
//!
//! Prompts are loaded at compile time from markdown files for easy maintenance.

/// Instruction sent with every meal photo
///
/// Asks the model to decide whether the image shows food before it
/// classifies the meal and enumerates items.
pub const MEAL_VISION_PROMPT: &str = include_str!("meal_vision.md");

/// Template for generative nutrition estimates
///
/// Placeholders: `{food_name}`, `{weight_grams}`.
pub const NUTRITION_ESTIMATE_PROMPT: &str = include_str!("nutrition_estimate.md");

/// Render the nutrition estimate prompt for one food at one weight
#[must_use]
pub fn nutrition_estimate_prompt(food_name: &str, weight_grams: f64) -> String {
    NUTRITION_ESTIMATE_PROMPT
        .replace("{food_name}", food_name)
        .replace("{weight_grams}", &format!("{weight_grams:.0}"))
}
