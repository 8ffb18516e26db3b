// ABOUTME: Caller-visible analysis errors (input rejection outcomes)
// ABOUTME: Non-food images and undecodable bytes, with conversion into AppError
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use serde_json::json;
use thiserror::Error;

use super::{AppError, ErrorCode};

/// Errors that `analyze` surfaces to its caller
///
/// Every other internal fault is absorbed by a fallback tier. These two are
/// legitimate input rejections and must reach the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnalysisError {
    /// The vision model judged the photo to contain no food
    #[error("image does not appear to contain food: {detected_content}")]
    NonFoodImage {
        /// The model's own description of what it saw
        detected_content: String,
    },
    /// The bytes are not a valid image
    #[error("failed to decode image: {message}")]
    Decode {
        /// Decoder diagnostic
        message: String,
    },
}

impl AnalysisError {
    /// Create a non-food rejection
    #[must_use]
    pub fn non_food(detected_content: impl Into<String>) -> Self {
        Self::NonFoodImage {
            detected_content: detected_content.into(),
        }
    }

    /// Create a decode failure
    #[must_use]
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Whether this is the non-food validation outcome
    #[must_use]
    pub const fn is_non_food(&self) -> bool {
        matches!(self, Self::NonFoodImage { .. })
    }
}

impl From<AnalysisError> for AppError {
    fn from(error: AnalysisError) -> Self {
        match error {
            AnalysisError::NonFoodImage { detected_content } => Self::new(
                ErrorCode::NonFoodImage,
                "This doesn't look like food. Please retake the photo.",
            )
            .with_details(json!({ "detected_content": detected_content })),
            AnalysisError::Decode { message } => {
                Self::new(ErrorCode::ImageDecodeFailed, message)
            }
        }
    }
}
