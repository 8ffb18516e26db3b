// ABOUTME: External API client modules (USDA FoodData Central)
// ABOUTME: Provides authoritative nutrient lookups with response caching and request budgeting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! External API Clients

pub mod usda_client;

pub use usda_client::{
    FoodNutrient, FoodRecord, FoodSummary, MockUsdaClient, UsdaClient, UsdaClientConfig,
};
