// ABOUTME: Meal analysis HTTP endpoint accepting raw image bytes
// ABOUTME: Maps query parameters to analysis options and analysis errors to HTTP responses
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Meal analysis routes
//!
//! `POST /api/meal-analysis` takes the photo as the raw request body. Weight
//! hints travel as a JSON-encoded query parameter so the body stays a plain
//! image upload:
//!
//! ```text
//! POST /api/meal-analysis?default_weight_grams=150&weight_hints=[{"food_name":"rice","grams":200}]
//! ```

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;

use crate::analyzer::{AnalysisOptions, WeightHint};
use crate::errors::AppError;
use crate::server::ServerResources;

/// Query parameters of the analysis endpoint
#[derive(Debug, Default, Deserialize)]
pub struct AnalysisQuery {
    /// Portion used for items without a weight estimate
    pub default_weight_grams: Option<f64>,
    /// JSON array of `{food_name, grams}` objects
    pub weight_hints: Option<String>,
}

impl AnalysisQuery {
    /// Convert into analysis options
    ///
    /// # Errors
    ///
    /// Returns an invalid input error if `weight_hints` is not a JSON array of hints.
    pub fn into_options(self) -> Result<AnalysisOptions, AppError> {
        let weight_hints = match self.weight_hints.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(raw) => serde_json::from_str::<Vec<WeightHint>>(raw)
                .map_err(|e| AppError::invalid_input(format!("Invalid weight_hints: {e}")))?,
        };
        Ok(AnalysisOptions {
            weight_hints,
            default_weight_grams: self.default_weight_grams,
        })
    }
}

/// Meal analysis routes handler
pub struct AnalysisRoutes;

impl AnalysisRoutes {
    /// Create the analysis routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/meal-analysis", post(Self::handle_analyze))
            .with_state(resources)
    }

    async fn handle_analyze(
        State(resources): State<Arc<ServerResources>>,
        Query(query): Query<AnalysisQuery>,
        body: Bytes,
    ) -> Result<Response, AppError> {
        let options = query.into_options()?;
        let result = resources.analyzer.analyze(&body, &options).await?;
        Ok((StatusCode::OK, Json(result)).into_response())
    }
}
