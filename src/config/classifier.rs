// ABOUTME: On-device classifier configuration
// ABOUTME: Model and label file locations for the ONNX backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::env;
use std::path::PathBuf;

/// Locations of the local classifier model and its labels
///
/// Both must be set for a local classifier to be loaded; otherwise the
/// pipeline runs remote-only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifierConfig {
    /// ONNX model file (224x224 RGB input, one logit per label)
    pub model_path: Option<PathBuf>,
    /// Newline-separated labels, one per model output
    pub labels_path: Option<PathBuf>,
}

impl ClassifierConfig {
    /// Load from `MEALSCAN_ONNX_MODEL_PATH` and `MEALSCAN_ONNX_LABELS_PATH`
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            model_path: env::var("MEALSCAN_ONNX_MODEL_PATH").ok().map(PathBuf::from),
            labels_path: env::var("MEALSCAN_ONNX_LABELS_PATH").ok().map(PathBuf::from),
        }
    }

    /// Whether both files are configured
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.model_path.is_some() && self.labels_path.is_some()
    }
}
