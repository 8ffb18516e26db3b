// ABOUTME: Detection orchestrator routing between local classification and remote vision
// ABOUTME: Validate-first, confidence-gated hybrid with local-only and generic fallbacks
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Detection Orchestrator
//!
//! Routing policy, each step degrading to the next:
//!
//! 1. Remote vision first. A non-food verdict ends detection immediately.
//! 2. With a usable remote answer and a local classifier, trust local results
//!    when their mean confidence reaches the trust threshold, otherwise merge.
//! 3. Without a local classifier, use the remote answer as-is.
//! 4. Without a usable remote answer, use local candidates alone.
//! 5. With nothing usable, emit a single generic item.
//!
//! Every outcome carries at least one candidate.

use std::fmt;

use tracing::{debug, instrument};

use super::local_classifier::LocalClassifier;
use super::merge::{mean_confidence, merge_candidates};
use super::preprocessor::PreprocessedImage;
use super::remote_detector::{fallback_candidate, RemoteDetection, RemoteVisionDetector};
use crate::config::DetectionThresholds;
use crate::errors::AnalysisError;
use crate::models::{DetectionRoute, FoodCandidate, MealClassification};

/// Why detection stopped early
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Remote vision judged the photo not to contain food
    NonFood,
}

/// Orchestrator lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectionState {
    /// Nothing has run yet
    NotStarted,
    /// Remote vision call and food gate in flight
    Validating,
    /// Local classifier running
    Classifying,
    /// Consuming the remote answer without a local classifier
    AwaitingRemote,
    /// Choosing and combining candidates
    Merging,
    /// Outcome assembled
    Done,
    /// Terminal failure
    Failed(FailureKind),
}

impl fmt::Display for DetectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "not_started"),
            Self::Validating => write!(f, "validating"),
            Self::Classifying => write!(f, "classifying"),
            Self::AwaitingRemote => write!(f, "awaiting_remote"),
            Self::Merging => write!(f, "merging"),
            Self::Done => write!(f, "done"),
            Self::Failed(FailureKind::NonFood) => write!(f, "failed(non_food)"),
        }
    }
}

/// Candidates chosen for nutrition resolution
#[derive(Debug, Clone)]
pub struct DetectionOutcome {
    /// At least one candidate, in final order
    pub candidates: Vec<FoodCandidate>,
    /// Meal classification (remote when available, else unknown)
    pub classification: MealClassification,
    /// Which policy branch produced the candidates
    pub route: DetectionRoute,
    /// States visited, starting with `NotStarted`
    pub trace: Vec<DetectionState>,
}

/// Records transitions for one detection run
struct StateTracker {
    trace: Vec<DetectionState>,
}

impl StateTracker {
    fn new() -> Self {
        Self {
            trace: vec![DetectionState::NotStarted],
        }
    }

    fn current(&self) -> DetectionState {
        self.trace
            .last()
            .copied()
            .unwrap_or(DetectionState::NotStarted)
    }

    fn enter(&mut self, next: DetectionState) {
        debug!(from = %self.current(), to = %next, "Detection state transition");
        self.trace.push(next);
    }
}

/// Coordinates the two detectors for one image
#[derive(Debug, Clone, Default)]
pub struct DetectionOrchestrator {
    remote: Option<RemoteVisionDetector>,
    local: Option<LocalClassifier>,
    thresholds: DetectionThresholds,
}

impl DetectionOrchestrator {
    /// Orchestrator with no detectors (always falls back)
    #[must_use]
    pub fn new(thresholds: DetectionThresholds) -> Self {
        Self {
            remote: None,
            local: None,
            thresholds,
        }
    }

    /// Attach the remote vision detector
    #[must_use]
    pub fn with_remote(mut self, remote: RemoteVisionDetector) -> Self {
        self.remote = Some(remote);
        self
    }

    /// Attach the local classifier
    #[must_use]
    pub fn with_local(mut self, local: LocalClassifier) -> Self {
        self.local = Some(local);
        self
    }

    /// Active thresholds
    #[must_use]
    pub const fn thresholds(&self) -> &DetectionThresholds {
        &self.thresholds
    }

    /// Whether a remote detector is configured
    #[must_use]
    pub const fn has_remote(&self) -> bool {
        self.remote.is_some()
    }

    /// Whether a local classifier is configured
    #[must_use]
    pub const fn has_local(&self) -> bool {
        self.local.is_some()
    }

    /// Run detection for one preprocessed image
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::NonFoodImage`] when remote vision rejects the photo.
    #[instrument(skip_all, fields(remote = self.remote.is_some(), local = self.local.is_some()))]
    pub async fn detect(
        &self,
        image: &PreprocessedImage,
    ) -> Result<DetectionOutcome, AnalysisError> {
        let mut states = StateTracker::new();

        let remote = match &self.remote {
            Some(detector) => {
                states.enter(DetectionState::Validating);
                match detector.detect(&image.payload).await {
                    Ok(detection) => Some(detection).filter(|d| !d.degraded),
                    Err(e) => {
                        states.enter(DetectionState::Failed(FailureKind::NonFood));
                        return Err(e);
                    }
                }
            }
            None => None,
        };

        let local = match &self.local {
            Some(classifier) => {
                states.enter(DetectionState::Classifying);
                Some(classifier.classify(&image.tensor).await)
            }
            None => {
                if remote.is_some() {
                    states.enter(DetectionState::AwaitingRemote);
                }
                None
            }
        };

        states.enter(DetectionState::Merging);
        let (candidates, classification, route) = self.route(remote, local);
        states.enter(DetectionState::Done);

        debug!(
            route = route.as_str(),
            items = candidates.len(),
            "Detection finished"
        );
        Ok(DetectionOutcome {
            candidates,
            classification,
            route,
            trace: states.trace,
        })
    }

    fn route(
        &self,
        remote: Option<RemoteDetection>,
        local: Option<Vec<FoodCandidate>>,
    ) -> (Vec<FoodCandidate>, MealClassification, DetectionRoute) {
        match (remote, local) {
            (Some(remote), Some(local)) => {
                let mean = mean_confidence(&local);
                if !local.is_empty() && mean >= self.thresholds.local_trust_threshold {
                    debug!(mean_confidence = mean, "Local results trusted");
                    (local, remote.classification, DetectionRoute::LocalTrusted)
                } else {
                    let merged = merge_candidates(&local, &remote.candidates, &self.thresholds);
                    if merged.is_empty() {
                        self.fallback()
                    } else {
                        (merged, remote.classification, DetectionRoute::Merged)
                    }
                }
            }
            (Some(remote), None) => (
                remote.candidates,
                remote.classification,
                DetectionRoute::RemoteOnly,
            ),
            (None, Some(local)) if !local.is_empty() => (
                local,
                MealClassification::unknown(),
                DetectionRoute::LocalOnly,
            ),
            (None, _) => self.fallback(),
        }
    }

    fn fallback(&self) -> (Vec<FoodCandidate>, MealClassification, DetectionRoute) {
        (
            vec![fallback_candidate(self.thresholds.fallback_confidence)],
            MealClassification::unknown(),
            DetectionRoute::Fallback,
        )
    }
}
