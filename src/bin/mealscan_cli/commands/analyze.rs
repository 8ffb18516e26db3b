// ABOUTME: `analyze` command: runs the full pipeline on a local image file
// ABOUTME: Prints the analysis result as JSON and waits for cache backfill before exiting
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::path::Path;

use anyhow::{Context, Result};
use mealscan::analyzer::{AnalysisOptions, MealAnalyzer, WeightHint};
use mealscan::config::ServerConfig;
use tracing::info;

use crate::helpers::{drain_backfill, print_json};

pub async fn run(
    image: &Path,
    weight_hints: Vec<WeightHint>,
    default_weight_grams: Option<f64>,
    pretty: bool,
) -> Result<()> {
    let bytes = tokio::fs::read(image)
        .await
        .with_context(|| format!("Failed to read {}", image.display()))?;

    let config = ServerConfig::from_env()?;
    let (analyzer, backfill) = MealAnalyzer::from_config(&config).await?;
    let options = AnalysisOptions {
        weight_hints,
        default_weight_grams,
    };

    info!(image = %image.display(), bytes = bytes.len(), "Analyzing meal photo");
    let result = analyzer.analyze(&bytes, &options).await;
    drop(analyzer);
    drain_backfill(backfill).await;

    print_json(&result?, pretty)
}
