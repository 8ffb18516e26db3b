// ABOUTME: LLM provider abstraction for multimodal vision detection and nutrition estimates
// ABOUTME: Defines the provider contract, capability flags, and chat request/response types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # LLM Provider Interface
//!
//! Language models are called from two places: the remote vision detector
//! (photo in, JSON verdict out) and the generative nutrition estimator (food
//! name in, JSON nutrients out). Both build a [`ChatRequest`] and hand it to an
//! [`LlmProvider`], which keeps the pipeline testable with scripted providers.
//!
//! ```rust,no_run
//! use mealscan::llm::{ChatMessage, ChatRequest, LlmProvider};
//!
//! async fn example(provider: &dyn LlmProvider) {
//!     let request = ChatRequest::new(vec![ChatMessage::user("Nutrition of 100 g rice?")])
//!         .with_json_mode()
//!         .with_temperature(0.1);
//!     let response = provider.complete(&request).await;
//! }
//! ```

mod gemini;
mod openai_compatible;
pub mod prompts;
mod provider;

pub use gemini::GeminiProvider;
pub use openai_compatible::{OpenAiCompatibleConfig, OpenAiCompatibleProvider};
pub use provider::ChatProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;

bitflags::bitflags! {
    /// What a provider can accept and emit
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
    pub struct LlmCapabilities: u8 {
        /// Accepts inline images
        const VISION = 0b0001;
        /// Can be forced to answer with a single JSON object
        const JSON_MODE = 0b0010;
        /// Honors a separate system instruction
        const SYSTEM_MESSAGES = 0b0100;
    }
}

impl LlmCapabilities {
    /// Everything the remote detector needs
    #[must_use]
    pub const fn multimodal_json() -> Self {
        Self::VISION
            .union(Self::JSON_MODE)
            .union(Self::SYSTEM_MESSAGES)
    }

    /// Whether photos can be sent
    #[must_use]
    pub const fn supports_vision(&self) -> bool {
        self.contains(Self::VISION)
    }
}

/// Who a message comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Standing instruction
    System,
    /// Prompt, optionally with images
    User,
}

impl MessageRole {
    /// Wire name used by `OpenAI`-style APIs
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
        }
    }
}

/// Base64 image sent inline with a prompt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageAttachment {
    /// e.g. `image/png`
    pub mime_type: String,
    /// Standard alphabet, padded
    pub data_base64: String,
}

impl ImageAttachment {
    /// Wrap an already encoded image
    #[must_use]
    pub fn new(mime_type: impl Into<String>, data_base64: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data_base64: data_base64.into(),
        }
    }

    /// `data:` URI form
    #[must_use]
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data_base64)
    }
}

/// One turn of a prompt
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender
    pub role: MessageRole,
    /// Text of the turn
    pub content: String,
    /// Inline photos
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub images: Vec<ImageAttachment>,
}

impl ChatMessage {
    fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            images: Vec::new(),
        }
    }

    /// Standing instruction
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Prompt text
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Attach a photo to this turn
    #[must_use]
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.images.push(image);
        self
    }
}

/// A single completion call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Prompt turns in order
    pub messages: Vec<ChatMessage>,
    /// Overrides the provider's default model
    pub model: Option<String>,
    /// Sampling temperature
    pub temperature: Option<f32>,
    /// Output cap
    pub max_tokens: Option<u32>,
    /// Force a JSON object answer
    pub json_mode: bool,
}

impl ChatRequest {
    /// Request with provider defaults
    #[must_use]
    pub const fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            model: None,
            temperature: None,
            max_tokens: None,
            json_mode: false,
        }
    }

    /// Pin a model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the sampling temperature
    #[must_use]
    pub const fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Cap output tokens
    #[must_use]
    pub const fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    /// Ask for a JSON object
    #[must_use]
    pub const fn with_json_mode(mut self) -> Self {
        self.json_mode = true;
        self
    }

    /// Whether this is a vision call
    #[must_use]
    pub fn has_images(&self) -> bool {
        self.messages.iter().any(|m| !m.images.is_empty())
    }
}

/// Text a provider answered with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// Raw answer, possibly wrapped in code fences
    pub content: String,
    /// Model that answered
    pub model: String,
    /// Provider stop reason, if reported
    pub finish_reason: Option<String>,
}

/// A chat-completion backend
///
/// Errors are [`AppError`]s; connection failures, timeouts and 5xx answers
/// must be transient so callers can degrade instead of failing the request.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Short identifier for logs and error messages
    fn name(&self) -> &'static str;

    /// What the backend can accept
    fn capabilities(&self) -> LlmCapabilities;

    /// Model used when a request does not pin one
    fn default_model(&self) -> &str;

    /// Run one completion
    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError>;
}
