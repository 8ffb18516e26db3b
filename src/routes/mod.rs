// ABOUTME: Route module organization for the meal analysis HTTP server
// ABOUTME: Analysis upload endpoint plus health and readiness probes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Meal photo analysis routes
pub mod analysis;
/// Health check and readiness routes
pub mod health;

pub use analysis::{AnalysisQuery, AnalysisRoutes};
pub use health::HealthRoutes;
