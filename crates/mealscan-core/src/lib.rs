// ABOUTME: Core types and constants for the mealscan analysis pipeline
// ABOUTME: Foundation crate with error handling, food/nutrition models, and policy constants
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

#![deny(unsafe_code)]

//! # Mealscan Core
//!
//! Foundation crate providing shared types and constants for the mealscan
//! meal photo analysis pipeline. This crate is designed to change infrequently,
//! enabling incremental compilation benefits in the workspace.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and the caller-facing `AnalysisError`
//! - **models**: Food items, nutrition values, meal classification, and cache entries
//! - **constants**: Policy defaults and static keyword tables
//! - **text**: Whole-word keyword matching over food names

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Policy defaults, USDA nutrient identifiers, and keyword tables
pub mod constants;

/// Core data models (food items, nutrition, meal analysis results)
pub mod models;

/// Whole-word keyword matching over food names
pub mod text;
