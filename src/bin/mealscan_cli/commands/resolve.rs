// ABOUTME: `resolve` command: tiered nutrition lookup for a single food and weight
// ABOUTME: Prints the nutrition and the tier that produced it as JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use anyhow::Result;
use mealscan::analyzer::MealAnalyzer;
use mealscan::config::ServerConfig;
use serde_json::json;

use crate::helpers::{drain_backfill, print_json};

pub async fn run(food: &str, grams: f64, pretty: bool) -> Result<()> {
    let config = ServerConfig::from_env()?;
    let (analyzer, backfill) = MealAnalyzer::from_config(&config).await?;

    let resolved = analyzer.resolver().resolve(food, grams).await;
    drop(analyzer);
    drain_backfill(backfill).await;

    print_json(
        &json!({
            "food": food,
            "weight_grams": resolved.nutrition.serving_size_grams,
            "tier": resolved.tier,
            "nutrition": resolved.nutrition,
        }),
        pretty,
    )
}
