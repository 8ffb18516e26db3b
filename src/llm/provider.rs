// ABOUTME: Runtime selection between the Gemini and local OpenAI-compatible providers
// ABOUTME: Chosen once at startup from MEALSCAN_LLM_PROVIDER and shared by detector and estimator
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fmt;

use async_trait::async_trait;
use tracing::info;

use super::{
    ChatRequest, ChatResponse, GeminiProvider, LlmCapabilities, LlmProvider,
    OpenAiCompatibleProvider,
};
use crate::config::LlmProviderType;
use crate::errors::AppError;

/// The configured LLM backend
pub enum ChatProvider {
    /// Google Gemini
    Gemini(GeminiProvider),
    /// Self-hosted `OpenAI`-compatible endpoint
    Local(OpenAiCompatibleProvider),
}

impl ChatProvider {
    /// Build the provider named by `provider_type`
    ///
    /// # Errors
    ///
    /// Returns an error if the provider's credentials or client cannot be set up.
    pub fn create(provider_type: LlmProviderType) -> Result<Self, AppError> {
        let provider = match provider_type {
            LlmProviderType::Gemini => Self::Gemini(GeminiProvider::from_env()?),
            LlmProviderType::Local => Self::Local(OpenAiCompatibleProvider::from_env()?),
        };
        info!(
            provider = %provider_type,
            model = provider.default_model(),
            "LLM provider selected (set {} to change)",
            LlmProviderType::ENV_VAR
        );
        Ok(provider)
    }

    fn inner(&self) -> &dyn LlmProvider {
        match self {
            Self::Gemini(p) => p,
            Self::Local(p) => p,
        }
    }
}

#[async_trait]
impl LlmProvider for ChatProvider {
    fn name(&self) -> &'static str {
        self.inner().name()
    }

    fn capabilities(&self) -> LlmCapabilities {
        self.inner().capabilities()
    }

    fn default_model(&self) -> &str {
        self.inner().default_model()
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        self.inner().complete(request).await
    }
}

impl fmt::Debug for ChatProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini(p) => f.debug_tuple("Gemini").field(p).finish(),
            Self::Local(p) => f.debug_tuple("Local").field(p).finish(),
        }
    }
}
