// ABOUTME: Remote vision detector that asks a multimodal LLM to validate and enumerate foods
// ABOUTME: Strict schema validation; non-food is an error, every other failure degrades to a generic item
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Remote Vision Detector
//!
//! Sends the meal photo with [`MEAL_VISION_PROMPT`] to a vision-capable
//! [`LlmProvider`] in JSON mode and turns the reply into food candidates.
//!
//! The model's answer is untrusted input. It goes through fence stripping,
//! strict JSON parsing, and schema validation before any domain object is
//! built. Only a well-formed `contains_food: false` answer escapes as an
//! error ([`AnalysisError::NonFoodImage`]); transport failures, timeouts,
//! and malformed replies all produce a degraded detection.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use super::preprocessor::EncodedPayload;
use crate::constants::detection::{
    FALLBACK_CONFIDENCE, FALLBACK_FOOD_NAME, FALLBACK_WEIGHT_GRAMS, REMOTE_TIMEOUT_SECS,
};
use crate::errors::AnalysisError;
use crate::llm::prompts::MEAL_VISION_PROMPT;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::models::{
    DetectionSource, FoodCandidate, FoodCategory, MealClassification, MealType, PreparationState,
};

/// Sampling temperature for detection requests
const DETECTION_TEMPERATURE: f32 = 0.1;

/// Output budget for the JSON answer
const DETECTION_MAX_TOKENS: u32 = 2048;

/// Reported when the model omits `detected_content` on a non-food answer
const UNDESCRIBED_CONTENT: &str = "unidentified non-food content";

/// Outcome of one remote detection call
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteDetection {
    /// Detected items in model order
    pub candidates: Vec<FoodCandidate>,
    /// Meal classification from the model
    pub classification: MealClassification,
    /// Model's short description of the photo
    pub detected_content: Option<String>,
    /// True when the call failed and `candidates` holds the generic fallback
    pub degraded: bool,
}

impl RemoteDetection {
    /// Generic single-item detection used when the remote call is unusable
    #[must_use]
    pub fn degraded() -> Self {
        Self {
            candidates: vec![fallback_candidate(FALLBACK_CONFIDENCE)],
            classification: MealClassification::unknown(),
            detected_content: None,
            degraded: true,
        }
    }
}

/// The catch-all "Mixed Food" candidate
#[must_use]
pub fn fallback_candidate(confidence: f64) -> FoodCandidate {
    FoodCandidate::new(
        FALLBACK_FOOD_NAME,
        confidence,
        FALLBACK_WEIGHT_GRAMS,
        DetectionSource::Fallback,
        0,
    )
    .with_category(FoodCategory::Other)
}

/// Why a model reply was rejected
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VisionParseError {
    /// Not JSON after fence stripping
    #[error("response is not valid JSON: {0}")]
    InvalidJson(String),
    /// JSON that breaks the response contract
    #[error("response violates schema: {0}")]
    Schema(String),
}

/// Parsed and validated model reply
#[derive(Debug, Clone, PartialEq)]
pub enum VisionVerdict {
    /// The photo shows no food
    NonFood {
        /// What the model saw instead
        detected_content: String,
    },
    /// Validated food detection
    Food(RemoteDetection),
}

/// Raw reply shape
#[derive(Debug, Deserialize)]
struct VisionResponse {
    contains_food: bool,
    #[serde(default)]
    detected_content: Option<String>,
    #[serde(default)]
    meal_type: Option<String>,
    #[serde(default)]
    meal_type_confidence: Option<f64>,
    #[serde(default)]
    meal_type_reason: Option<String>,
    #[serde(default)]
    foods: Vec<VisionFood>,
}

#[derive(Debug, Deserialize)]
struct VisionFood {
    #[serde(default)]
    name: String,
    estimated_weight: f64,
    confidence: f64,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    preparation_state: Option<String>,
    #[serde(default)]
    alternative_names: Vec<String>,
}

fn fence_pattern() -> Option<&'static Regex> {
    static FENCE: OnceLock<Option<Regex>> = OnceLock::new();
    FENCE
        .get_or_init(|| Regex::new(r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$").ok())
        .as_ref()
}

/// Remove an optional Markdown code fence around the reply
#[must_use]
pub fn strip_code_fences(text: &str) -> &str {
    fence_pattern()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .map_or_else(|| text.trim(), |m| m.as_str())
}

fn is_unit(value: f64) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Parse and validate a model reply
///
/// # Errors
///
/// Returns [`VisionParseError`] when the text is not JSON or breaks the
/// response contract.
pub fn parse_vision_response(text: &str) -> Result<VisionVerdict, VisionParseError> {
    let body = strip_code_fences(text);
    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|e| VisionParseError::InvalidJson(e.to_string()))?;
    let response: VisionResponse =
        serde_json::from_value(value).map_err(|e| VisionParseError::Schema(e.to_string()))?;

    if !response.contains_food {
        let detected_content = response
            .detected_content
            .map(|c| c.trim().to_owned())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| UNDESCRIBED_CONTENT.to_owned());
        return Ok(VisionVerdict::NonFood { detected_content });
    }

    let meal_type_label = response
        .meal_type
        .ok_or_else(|| VisionParseError::Schema("meal_type missing".to_owned()))?;
    let meal_type = MealType::parse_label(&meal_type_label).ok_or_else(|| {
        VisionParseError::Schema(format!("unknown meal_type '{meal_type_label}'"))
    })?;
    let meal_confidence = response.meal_type_confidence.unwrap_or(0.0);
    if !is_unit(meal_confidence) {
        return Err(VisionParseError::Schema(format!(
            "meal_type_confidence {meal_confidence} outside [0, 1]"
        )));
    }

    if response.foods.is_empty() {
        return Err(VisionParseError::Schema(
            "contains_food is true but foods is empty".to_owned(),
        ));
    }

    let candidates = response
        .foods
        .into_iter()
        .enumerate()
        .map(|(rank, food)| validate_food(rank, food))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(VisionVerdict::Food(RemoteDetection {
        candidates,
        classification: MealClassification::new(
            meal_type,
            meal_confidence,
            response.meal_type_reason,
        ),
        detected_content: response.detected_content,
        degraded: false,
    }))
}

fn validate_food(rank: usize, food: VisionFood) -> Result<FoodCandidate, VisionParseError> {
    let name = food.name.trim();
    if name.is_empty() {
        return Err(VisionParseError::Schema(format!("food #{rank} has no name")));
    }
    if !(food.estimated_weight.is_finite() && food.estimated_weight > 0.0) {
        return Err(VisionParseError::Schema(format!(
            "food '{name}' has invalid weight {}",
            food.estimated_weight
        )));
    }
    if !is_unit(food.confidence) {
        return Err(VisionParseError::Schema(format!(
            "food '{name}' has confidence {} outside [0, 1]",
            food.confidence
        )));
    }

    let mut candidate = FoodCandidate::new(
        name,
        food.confidence,
        food.estimated_weight,
        DetectionSource::Remote,
        rank,
    )
    .with_alternatives(
        food.alternative_names
            .into_iter()
            .map(|n| n.trim().to_owned())
            .filter(|n| !n.is_empty())
            .collect(),
    );
    // Unrecognised category labels keep the name-inferred category
    if let Some(category) = food.category.as_deref().and_then(FoodCategory::parse_label) {
        candidate = candidate.with_category(category);
    }
    if let Some(state) = food.preparation_state.as_deref() {
        candidate = candidate.with_preparation(PreparationState::from_str_lossy(state));
    }
    Ok(candidate)
}

/// Multimodal LLM food detector
#[derive(Clone)]
pub struct RemoteVisionDetector {
    provider: Arc<dyn LlmProvider>,
    timeout: Duration,
    model: Option<String>,
}

impl RemoteVisionDetector {
    /// Create a detector over a vision-capable provider
    #[must_use]
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        if !provider.capabilities().supports_vision() {
            warn!(
                provider = provider.name(),
                "LLM provider does not advertise vision support"
            );
        }
        Self {
            provider,
            timeout: Duration::from_secs(REMOTE_TIMEOUT_SECS),
            model: None,
        }
    }

    /// Hard deadline for the whole call
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Override the provider's default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Provider identifier
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    fn build_request(&self, payload: &EncodedPayload) -> ChatRequest {
        let request = ChatRequest::new(vec![
            ChatMessage::user(MEAL_VISION_PROMPT).with_image(payload.to_attachment())
        ])
        .with_json_mode()
        .with_temperature(DETECTION_TEMPERATURE)
        .with_max_tokens(DETECTION_MAX_TOKENS);
        match &self.model {
            Some(model) => request.with_model(model.clone()),
            None => request,
        }
    }

    /// Detect foods in an encoded photo
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NonFoodImage`] when the model judges the photo
    /// not to contain food. All other failures degrade.
    #[instrument(skip_all, fields(provider = self.provider.name(), bytes = payload.bytes.len()))]
    pub async fn detect(&self, payload: &EncodedPayload) -> Result<RemoteDetection, AnalysisError> {
        let request = self.build_request(payload);

        let response =
            match tokio::time::timeout(self.timeout, self.provider.complete(&request)).await {
                Ok(Ok(response)) => response,
                Ok(Err(e)) => {
                    warn!(error = %e, "Remote vision call failed, degrading");
                    return Ok(RemoteDetection::degraded());
                }
                Err(_) => {
                    warn!(
                        timeout_secs = self.timeout.as_secs(),
                        "Remote vision call timed out, degrading"
                    );
                    return Ok(RemoteDetection::degraded());
                }
            };

        match parse_vision_response(&response.content) {
            Ok(VisionVerdict::NonFood { detected_content }) => {
                info!(detected_content = %detected_content, "Image rejected as non-food");
                Err(AnalysisError::non_food(detected_content))
            }
            Ok(VisionVerdict::Food(detection)) => {
                debug!(
                    items = detection.candidates.len(),
                    meal_type = ?detection.classification.meal_type,
                    "Remote vision detection"
                );
                Ok(detection)
            }
            Err(e) => {
                warn!(error = %e, "Remote vision reply rejected, degrading");
                Ok(RemoteDetection::degraded())
            }
        }
    }
}

impl std::fmt::Debug for RemoteVisionDetector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteVisionDetector")
            .field("provider", &self.provider.name())
            .field("timeout", &self.timeout)
            .field("model", &self.model)
            .finish()
    }
}
