// ABOUTME: Argument parsing and output helpers for mealscan-cli
// ABOUTME: Weight hint parsing, JSON printing, and bounded backfill draining
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::time::Duration;

use anyhow::Result;
use mealscan::analyzer::WeightHint;
use mealscan::nutrition::BackfillStats;
use serde::Serialize;
use tokio::task::JoinHandle;
use tracing::{info, warn};

const BACKFILL_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Parse `name=grams` into a weight hint
pub fn parse_weight_hint(raw: &str) -> Result<WeightHint, String> {
    let (name, grams) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected name=grams, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing food name in '{raw}'"));
    }
    let grams: f64 = grams
        .trim()
        .parse()
        .map_err(|e| format!("invalid grams in '{raw}': {e}"))?;
    if !(grams.is_finite() && grams > 0.0) {
        return Err(format!("grams must be positive in '{raw}'"));
    }
    Ok(WeightHint::new(name, grams))
}

/// Print a value as JSON on stdout
pub fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{text}");
    Ok(())
}

/// Give queued cache writes a few seconds to land before the process exits
pub async fn drain_backfill(handle: JoinHandle<BackfillStats>) {
    match tokio::time::timeout(BACKFILL_DRAIN_TIMEOUT, handle).await {
        Ok(Ok(stats)) => info!(written = stats.written, failed = stats.failed, "Backfill drained"),
        Ok(Err(e)) => warn!(error = %e, "Backfill worker ended abnormally"),
        Err(_) => warn!("Backfill still running at exit, remaining entries dropped"),
    }
}
