// ABOUTME: HTTP server binary for meal photo analysis
// ABOUTME: Loads environment configuration, initializes logging, and serves the analysis API
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! # Mealscan Server Binary
//!
//! Serves `POST /api/meal-analysis`, `GET /health` and `GET /ready`.

use anyhow::Result;
use clap::Parser;
use mealscan::{config::ServerConfig, logging, server};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "mealscan-server")]
#[command(about = "Mealscan - meal photo analysis and nutrition estimation API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    port: Option<u16>,

    /// Override bind address
    #[arg(long)]
    host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    logging::init_from_env()?;

    let mut config = ServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.http_port = port;
    }
    if let Some(host) = args.host {
        config.host = host;
    }

    info!("Starting Mealscan server");
    info!("{}", config.summary());

    if let Err(e) = server::run(config).await {
        error!("Server error: {e}");
        return Err(e.into());
    }

    info!("Server stopped");
    Ok(())
}
