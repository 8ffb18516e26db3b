// ABOUTME: Food detection from meal photos
// ABOUTME: Preprocessing, on-device classification, remote vision, merging, and routing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Vision
//!
//! Turns an uploaded photo into a non-empty list of [`FoodCandidate`]s.
//!
//! [`FoodCandidate`]: crate::models::FoodCandidate

/// Local classifier adapter and backend trait
pub mod local_classifier;
/// Candidate deduplication and merge policy
pub mod merge;
/// ONNX classifier backend
#[cfg(feature = "onnx")]
pub mod onnx;
/// Detector routing state machine
pub mod orchestrator;
/// Image decoding and tensor/payload preparation
pub mod preprocessor;
/// Multimodal LLM detector
pub mod remote_detector;

pub use local_classifier::{ClassifierBackend, LabelScore, LocalClassifier};
pub use merge::{mean_confidence, merge_candidates, names_overlap};
#[cfg(feature = "onnx")]
pub use onnx::OnnxClassifier;
pub use orchestrator::{DetectionOrchestrator, DetectionOutcome, DetectionState, FailureKind};
pub use preprocessor::{
    preprocess, preprocess_with_limit, EncodedPayload, ImageTensor, PreprocessedImage,
};
pub use remote_detector::{
    fallback_candidate, parse_vision_response, strip_code_fences, RemoteDetection,
    RemoteVisionDetector, VisionParseError, VisionVerdict,
};
