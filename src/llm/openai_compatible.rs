// ABOUTME: OpenAI-compatible chat completions provider for self-hosted vision models
// ABOUTME: Sends photos as data-URI image_url parts; works with Ollama, vLLM and LocalAI
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # `OpenAI`-Compatible Provider
//!
//! Lets the pipeline run against a local vision model such as `llava` served
//! by Ollama.
//!
//! - `LOCAL_LLM_BASE_URL`: API root (default <http://localhost:11434/v1>)
//! - `LOCAL_LLM_MODEL`: model name (default `llava:13b`)
//! - `LOCAL_LLM_API_KEY`: bearer token, usually unset for local servers

use std::env;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::{ChatMessage, ChatRequest, ChatResponse, LlmCapabilities, LlmProvider};
use crate::errors::{AppError, ErrorCode};

const BASE_URL_ENV: &str = "LOCAL_LLM_BASE_URL";
const MODEL_ENV: &str = "LOCAL_LLM_MODEL";
const API_KEY_ENV: &str = "LOCAL_LLM_API_KEY";
const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";
const DEFAULT_MODEL: &str = "llava:13b";
const CONNECT_TIMEOUT_SECS: u64 = 10;
/// Local vision inference on CPU can take minutes; callers apply their own deadline
const REQUEST_TIMEOUT_SECS: u64 = 300;
const SERVICE: &str = "local_llm";

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Text-only turns send `content` as a string, turns with photos as parts
#[derive(Debug, Serialize)]
struct WireMessage {
    role: &'static str,
    content: WireContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum WireContent {
    Text(String),
    Parts(Vec<WirePart>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WirePart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Serialize)]
struct ImageUrl {
    url: String,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        let content = if message.images.is_empty() {
            WireContent::Text(message.content.clone())
        } else {
            let images = message.images.iter().map(|image| WirePart::ImageUrl {
                image_url: ImageUrl {
                    url: image.data_uri(),
                },
            });
            let text = WirePart::Text {
                text: message.content.clone(),
            };
            WireContent::Parts(images.chain(std::iter::once(text)).collect())
        };
        Self {
            role: message.role.as_str(),
            content,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// Endpoint settings for [`OpenAiCompatibleProvider`]
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    /// API root ending in `/v1`
    pub base_url: String,
    /// Bearer token, if the server wants one
    pub api_key: Option<String>,
    /// Model used when a request does not pin one
    pub default_model: String,
    /// Advertised capabilities
    pub capabilities: LlmCapabilities,
}

impl Default for OpenAiCompatibleConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            default_model: DEFAULT_MODEL.to_owned(),
            capabilities: LlmCapabilities::multimodal_json(),
        }
    }
}

impl OpenAiCompatibleConfig {
    /// Read `LOCAL_LLM_*` variables over the defaults
    #[must_use]
    pub fn from_env() -> Self {
        let non_empty = |key: &str| env::var(key).ok().filter(|v| !v.trim().is_empty());
        let defaults = Self::default();
        Self {
            base_url: non_empty(BASE_URL_ENV).unwrap_or(defaults.base_url),
            api_key: non_empty(API_KEY_ENV),
            default_model: non_empty(MODEL_ENV).unwrap_or(defaults.default_model),
            capabilities: defaults.capabilities,
        }
    }
}

/// Provider for any `/chat/completions` endpoint
pub struct OpenAiCompatibleProvider {
    client: Client,
    config: OpenAiCompatibleConfig,
}

impl OpenAiCompatibleProvider {
    /// Build the HTTP client for `config`
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("HTTP client setup failed: {e}")))?;
        Ok(Self { client, config })
    }

    /// Provider configured from `LOCAL_LLM_*` variables
    ///
    /// # Errors
    ///
    /// Returns an internal error if the HTTP client cannot be built.
    pub fn from_env() -> Result<Self, AppError> {
        let config = OpenAiCompatibleConfig::from_env();
        info!(base_url = %config.base_url, model = %config.default_model, "Local LLM provider configured");
        Self::new(config)
    }

    fn build_body<'a>(&'a self, request: &'a ChatRequest) -> CompletionRequest<'a> {
        CompletionRequest {
            model: request
                .model
                .as_deref()
                .unwrap_or(&self.config.default_model),
            messages: request.messages.iter().map(WireMessage::from).collect(),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: false,
            response_format: request
                .json_mode
                .then_some(ResponseFormat { kind: "json_object" }),
        }
    }

    /// Local servers often answer with plain text; gateway codes mean the model server is down
    fn status_error(status: StatusCode, body: &str) -> AppError {
        let message = serde_json::from_str::<ErrorEnvelope>(body)
            .map_or_else(|_| body.chars().take(200).collect(), |e| e.error.message);
        match status.as_u16() {
            401 | 403 => AppError::new(
                ErrorCode::ExternalAuthFailed,
                format!("endpoint rejected credentials: {message}"),
            ),
            400 => AppError::invalid_input(format!("endpoint rejected the request: {message}")),
            404 => AppError::not_found(format!("model or endpoint ({message})")),
            429 => AppError::new(ErrorCode::ExternalRateLimited, message),
            502..=504 => AppError::external_unavailable(SERVICE, format!("HTTP {status}: {message}")),
            _ => AppError::external_service(SERVICE, format!("HTTP {status}: {message}")),
        }
    }

    fn send_error(&self, e: &reqwest::Error) -> AppError {
        if e.is_timeout() {
            AppError::external_timeout(SERVICE, REQUEST_TIMEOUT_SECS)
        } else if e.is_connect() {
            AppError::external_unavailable(
                SERVICE,
                format!("no server at {}", self.config.base_url),
            )
        } else {
            AppError::external_service(SERVICE, format!("request failed: {e}"))
        }
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatibleProvider {
    fn name(&self) -> &'static str {
        SERVICE
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.config.capabilities
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    #[instrument(skip_all, fields(images = request.has_images()))]
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        let body = self.build_body(request);
        let url = format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        );
        let mut http = self.client.post(url).json(&body);
        if let Some(key) = &self.config.api_key {
            http = http.bearer_auth(key);
        }

        let response = http.send().await.map_err(|e| self.send_error(&e))?;
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| AppError::external_service(SERVICE, format!("unreadable body: {e}")))?;
        if !status.is_success() {
            warn!(%status, model = body.model, "local LLM call failed");
            return Err(Self::status_error(status, &text));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text)
            .map_err(|e| AppError::external_service(SERVICE, format!("unparseable body: {e}")))?;
        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AppError::external_service(SERVICE, "no choices returned"))?;
        let content = choice
            .message
            .content
            .filter(|c| !c.trim().is_empty())
            .ok_or_else(|| AppError::external_service(SERVICE, "empty answer"))?;
        debug!(chars = content.len(), finish_reason = ?choice.finish_reason, "local LLM answered");

        Ok(ChatResponse {
            content,
            model: parsed.model.unwrap_or_else(|| body.model.to_owned()),
            finish_reason: choice.finish_reason,
        })
    }
}

impl Debug for OpenAiCompatibleProvider {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("OpenAiCompatibleProvider")
            .field("base_url", &self.config.base_url)
            .field("default_model", &self.config.default_model)
            .field("api_key", &self.config.api_key.as_ref().map(|_| "[REDACTED]"))
            .finish_non_exhaustive()
    }
}
