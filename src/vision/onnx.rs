// ABOUTME: ONNX classifier backend running MobileNet-style models through tract
// ABOUTME: Loads the model and newline-separated labels once; softmax over logits per prediction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::fs;
use std::path::Path;

use tract_onnx::prelude::*;
use tracing::info;

use super::local_classifier::{ClassifierBackend, LabelScore};
use super::preprocessor::ImageTensor;
use crate::config::ClassifierConfig;
use crate::errors::{AppError, AppResult, ErrorCode};

type OnnxPlan = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// `ImageNet` normalization applied on top of the `[0, 1]` tensor
const MEAN: [f32; 3] = [0.485, 0.456, 0.406];
const STD: [f32; 3] = [0.229, 0.224, 0.225];

/// Classifier backed by an ONNX model file
pub struct OnnxClassifier {
    plan: OnnxPlan,
    labels: Vec<String>,
    input_size: usize,
}

impl OnnxClassifier {
    /// Load model and labels from the configured paths
    ///
    /// # Errors
    ///
    /// Returns a configuration error when either path is missing or unreadable.
    pub fn from_config(config: &ClassifierConfig) -> AppResult<Self> {
        let (Some(model_path), Some(labels_path)) = (&config.model_path, &config.labels_path)
        else {
            return Err(AppError::new(
                ErrorCode::ConfigMissing,
                "MEALSCAN_ONNX_MODEL_PATH and MEALSCAN_ONNX_LABELS_PATH must both be set",
            ));
        };
        Self::load(model_path, labels_path, 224)
    }

    /// Load a model expecting `[1, 3, size, size]` input
    ///
    /// # Errors
    ///
    /// Returns an error when the model cannot be parsed or optimized, or the
    /// label file cannot be read.
    pub fn load(model_path: &Path, labels_path: &Path, input_size: usize) -> AppResult<Self> {
        let labels: Vec<String> = fs::read_to_string(labels_path)
            .map_err(|e| AppError::config(format!("cannot read labels {labels_path:?}: {e}")))?
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_owned)
            .collect();
        if labels.is_empty() {
            return Err(AppError::config(format!("label file {labels_path:?} is empty")));
        }

        let load_error =
            |e: TractError| AppError::config(format!("cannot load model {model_path:?}: {e}"));
        let plan = tract_onnx::onnx()
            .model_for_path(model_path)
            .map_err(load_error)?
            .with_input_fact(0, f32::fact([1, 3, input_size, input_size]).into())
            .map_err(load_error)?
            .into_optimized()
            .map_err(load_error)?
            .into_runnable()
            .map_err(load_error)?;

        info!(
            model = %model_path.display(),
            labels = labels.len(),
            "ONNX classifier loaded"
        );
        Ok(Self {
            plan,
            labels,
            input_size,
        })
    }
}

impl ClassifierBackend for OnnxClassifier {
    fn name(&self) -> &'static str {
        "onnx"
    }

    fn is_loaded(&self) -> bool {
        true
    }

    fn predict(&self, tensor: &ImageTensor) -> AppResult<Vec<LabelScore>> {
        let side = tensor.size() as usize;
        if side != self.input_size {
            return Err(AppError::invalid_input(format!(
                "tensor is {side}px, model expects {}px",
                self.input_size
            )));
        }

        let data = tensor.as_slice();
        let plane = side * side;
        let input: Tensor =
            tract_ndarray::Array4::from_shape_fn((1, 3, side, side), |(_, c, y, x)| {
                (data[c * plane + y * side + x] - MEAN[c]) / STD[c]
            })
            .into();

        let outputs = self
            .plan
            .run(tvec!(input.into()))
            .map_err(|e| AppError::internal(format!("ONNX inference failed: {e}")))?;
        let logits = outputs[0]
            .to_array_view::<f32>()
            .map_err(|e| AppError::internal(format!("unexpected ONNX output: {e}")))?;

        let logits: Vec<f32> = logits.iter().copied().collect();
        Ok(softmax(&logits)
            .into_iter()
            .zip(&self.labels)
            .map(|(p, label)| LabelScore::new(label.clone(), f64::from(p)))
            .collect())
    }
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        vec![0.0; logits.len()]
    }
}
