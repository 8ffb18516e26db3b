// ABOUTME: Main library entry point for the mealscan meal photo analysis service
// ABOUTME: Hybrid food detection plus tiered nutrition resolution behind an HTTP API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Mealscan
//!
//! Turns a photo of a meal into a structured nutrition estimate.
//!
//! ## Pipeline
//!
//! 1. **Preprocess**: decode the upload into a classifier tensor and a
//!    PNG payload for the vision model.
//! 2. **Detect**: a multimodal LLM validates the photo shows food and lists
//!    the items; an optional on-device classifier is trusted or merged by
//!    confidence.
//! 3. **Resolve**: each item's nutrition comes from the first tier that
//!    answers: cache, USDA `FoodData` Central, LLM estimate, heuristic.
//!    External answers are backfilled into the cache asynchronously.
//! 4. **Aggregate**: totals, dominant category, confidence, allergens.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use mealscan::analyzer::{AnalysisOptions, MealAnalyzer};
//! use mealscan::config::ServerConfig;
//! use mealscan::errors::AppResult;
//!
//! #[tokio::main]
//! async fn main() -> AppResult<()> {
//!     let config = ServerConfig::from_env()?;
//!     let (analyzer, _backfill) = MealAnalyzer::from_config(&config).await?;
//!
//!     let photo = std::fs::read("lunch.jpg").unwrap_or_default();
//!     let options = AnalysisOptions::default().with_hint("rice", 180.0);
//!     let result = analyzer.analyze(&photo, &options).await?;
//!     println!("{} kcal", result.total_nutrition.calories);
//!     Ok(())
//! }
//! ```

/// Result aggregation and allergen detection
pub mod analysis;

/// End-to-end analysis facade
pub mod analyzer;

/// Nutrition cache backends
pub mod cache;

/// Atomic circuit breaker for external dependencies
pub mod circuit_breaker;

/// Environment-driven configuration
pub mod config;

/// Policy constants and keyword tables
pub mod constants;

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// External API clients (USDA `FoodData` Central)
pub mod external;

/// LLM provider abstraction and prompts
pub mod llm;

/// Structured logging setup
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Food, nutrition and meal models
pub mod models;

/// Tiered nutrition resolution
pub mod nutrition;

/// HTTP route handlers
pub mod routes;

/// HTTP server assembly
pub mod server;

/// Image preprocessing and food detection
pub mod vision;
