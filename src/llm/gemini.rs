// ABOUTME: Google Gemini provider sending photos as inline_data parts to generateContent
// ABOUTME: Requests application/json output for detection verdicts and nutrient estimates
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Gemini Provider
//!
//! `GEMINI_API_KEY` is required; `GEMINI_MODEL` overrides the default model.
//! System turns travel in `systemInstruction`, images precede the prompt text
//! in the user turn, and JSON mode sets `responseMimeType`.

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider, MessageRole};
use crate::errors::{AppError, ErrorCode};

const API_KEY_ENV: &str = "GEMINI_API_KEY";
const MODEL_ENV: &str = "GEMINI_MODEL";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const SERVICE: &str = "gemini";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    candidate_count: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

/// Google Gemini provider
pub struct GeminiProvider {
    api_key: String,
    client: Client,
    default_model: String,
    base_url: String,
}

impl GeminiProvider {
    /// Provider for `api_key` against the public endpoint
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            default_model: DEFAULT_MODEL.to_owned(),
            base_url: API_BASE_URL.to_owned(),
        }
    }

    /// Provider configured from `GEMINI_API_KEY` and `GEMINI_MODEL`
    ///
    /// # Errors
    ///
    /// Returns `ConfigMissing` when no API key is set.
    pub fn from_env() -> Result<Self, AppError> {
        let api_key = env::var(API_KEY_ENV)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| {
                AppError::new(ErrorCode::ConfigMissing, format!("{API_KEY_ENV} is not set"))
            })?;
        let provider = Self::new(api_key);
        Ok(match env::var(MODEL_ENV) {
            Ok(model) if !model.trim().is_empty() => provider.with_default_model(model.trim()),
            _ => provider,
        })
    }

    /// Use another model when requests do not pin one
    #[must_use]
    pub fn with_default_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    /// Point at another API root
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn user_content(message: &ChatMessage) -> Content {
        let mut parts: Vec<Part> = message
            .images
            .iter()
            .map(|image| Part::Inline {
                inline_data: InlineData {
                    mime_type: image.mime_type.clone(),
                    data: image.data_base64.clone(),
                },
            })
            .collect();
        if !message.content.is_empty() {
            parts.push(Part::Text {
                text: message.content.clone(),
            });
        }
        Content {
            role: Some("user".to_owned()),
            parts,
        }
    }

    fn build_body(request: &ChatRequest) -> GenerateContentRequest {
        let system_instruction = request
            .messages
            .iter()
            .filter(|m| m.role == MessageRole::System)
            .map(|m| m.content.as_str())
            .reduce(|_, last| last)
            .map(|text| Content {
                role: None,
                parts: vec![Part::Text {
                    text: text.to_owned(),
                }],
            });

        GenerateContentRequest {
            contents: request
                .messages
                .iter()
                .filter(|m| m.role == MessageRole::User)
                .map(Self::user_content)
                .collect(),
            system_instruction,
            generation_config: GenerationConfig {
                candidate_count: 1,
                temperature: request.temperature,
                max_output_tokens: request.max_tokens,
                response_mime_type: request.json_mode.then_some("application/json"),
            },
        }
    }

    /// Concatenated text of the first candidate
    fn answer_text(response: &GenerateContentResponse) -> Option<String> {
        let text: String = response
            .candidates
            .first()?
            .content
            .as_ref()?
            .parts
            .iter()
            .filter_map(|part| match part {
                Part::Text { text } => Some(text.as_str()),
                Part::Inline { .. } => None,
            })
            .collect();
        (!text.trim().is_empty()).then_some(text)
    }

    /// Auth and request errors are permanent; quota and server errors are not
    fn status_error(status: StatusCode, body: &str) -> AppError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.error.message);
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("Gemini rejected the API key: {message}"),
            ),
            400 => AppError::invalid_input(format!("Gemini rejected the request: {message}")),
            429 => AppError::new(
                ErrorCode::ExternalRateLimited,
                format!("Gemini quota exhausted: {message}"),
            ),
            _ => AppError::external_service(SERVICE, format!("HTTP {status}: {message}")),
        }
    }
}

#[async_trait]
impl LlmProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn capabilities(&self) -> LlmCapabilities {
        LlmCapabilities::multimodal_json()
    }

    fn default_model(&self) -> &str {
        &self.default_model
    }

    #[instrument(skip_all, fields(images = request.has_images()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let model = request.model.as_deref().unwrap_or(&self.default_model);
        let url = format!("{}/models/{model}:generateContent", self.base_url);

        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(&Self::build_body(request))
            .send()
            .await
            .map_err(|e| AppError::external_unavailable(SERVICE, format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("unreadable body: {e}")))?;
        if !status.is_success() {
            warn!(%status, model, "Gemini call failed");
            return Err(Self::status_error(status, &body));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| AppError::external_service(SERVICE, format!("unparseable body: {e}")))?;
        if let Some(error) = parsed.error {
            return Err(AppError::external_service(SERVICE, error.message));
        }
        let content = Self::answer_text(&parsed)
            .ok_or_else(|| AppError::external_service(SERVICE, "answer has no text"))?;
        debug!(model, chars = content.len(), "Gemini answered");

        Ok(ChatResponse {
            content,
            model: model.to_owned(),
            finish_reason: parsed
                .candidates
                .into_iter()
                .next()
                .and_then(|c| c.finish_reason),
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiProvider")
            .field("default_model", &self.default_model)
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}
