// ABOUTME: Generative nutrition estimator backed by a JSON-mode LLM call
// ABOUTME: Strictly validates the model's nutrient object before it reaches the resolver
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::constants::detection::REMOTE_TIMEOUT_SECS;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::nutrition_estimate_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::NutritionInfo;
use crate::vision::strip_code_fences;

const ESTIMATE_TEMPERATURE: f32 = 0.2;
const ESTIMATE_MAX_TOKENS: u32 = 1024;

/// Source of model-estimated nutrition for a named portion
#[async_trait]
pub trait NutritionEstimator: Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &'static str;

    /// Estimate nutrition for `weight_grams` of `food_name`
    ///
    /// The returned values are absolute for the requested weight.
    ///
    /// # Errors
    ///
    /// Returns an error when the estimate cannot be produced or fails validation.
    async fn estimate(&self, food_name: &str, weight_grams: f64) -> AppResult<NutritionInfo>;
}

#[derive(Debug, Deserialize)]
struct EstimateReply {
    calories: f64,
    protein: f64,
    carbs: f64,
    fat: f64,
    #[serde(default)]
    fiber: f64,
    #[serde(default)]
    sugar: f64,
    #[serde(default)]
    sodium: f64,
    #[serde(default)]
    vitamins: BTreeMap<String, f64>,
    #[serde(default)]
    minerals: BTreeMap<String, f64>,
}

/// Parse and validate a nutrient reply for a portion of `weight_grams`
///
/// # Errors
///
/// Returns a serialization error for malformed JSON, missing macronutrients,
/// or negative/non-finite core values.
pub fn parse_estimate(text: &str, weight_grams: f64) -> AppResult<NutritionInfo> {
    let reply: EstimateReply = serde_json::from_str(strip_code_fences(text))?;

    for (field, value) in [
        ("calories", reply.calories),
        ("protein", reply.protein),
        ("carbs", reply.carbs),
        ("fat", reply.fat),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(AppError::serialization(format!(
                "estimate field '{field}' out of range: {value}"
            )));
        }
    }

    Ok(NutritionInfo {
        calories: reply.calories,
        protein: reply.protein,
        carbs: reply.carbs,
        fat: reply.fat,
        fiber: reply.fiber,
        sugar: reply.sugar,
        sodium: reply.sodium,
        serving_size_grams: weight_grams,
        vitamins: reply.vitamins,
        minerals: reply.minerals,
    }
    .sanitized())
}

/// [`NutritionEstimator`] that prompts an LLM provider in JSON mode
#[derive(Clone)]
pub struct LlmNutritionEstimator {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
}

impl LlmNutritionEstimator {
    /// Create an estimator over `provider`
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            timeout: Duration::from_secs(REMOTE_TIMEOUT_SECS),
        }
    }

    /// Deadline for one estimate
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
impl NutritionEstimator for LlmNutritionEstimator {
    fn name(&self) -> &'static str {
        self.provider.name()
    }

    async fn estimate(&self, food_name: &str, weight_grams: f64) -> AppResult<NutritionInfo> {
        let request = ChatRequest::new(vec![ChatMessage::user(nutrition_estimate_prompt(
            food_name,
            weight_grams,
        ))])
        .with_json_mode()
        .with_temperature(ESTIMATE_TEMPERATURE)
        .with_max_tokens(ESTIMATE_MAX_TOKENS);

        let response = tokio::time::timeout(self.timeout, self.provider.complete(&request))
            .await
            .map_err(|_| AppError::external_timeout(self.provider.name(), self.timeout.as_secs()))??;

        let nutrition = parse_estimate(&response.content, weight_grams)?;
        debug!(
            food = food_name,
            calories = nutrition.calories,
            "Generative nutrition estimate"
        );
        Ok(nutrition)
    }
}
