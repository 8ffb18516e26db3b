// ABOUTME: Mealscan CLI - analyze meal photos and resolve nutrition from the command line
// ABOUTME: Runs the same pipeline as the server against local files and prints JSON
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence
//!
//! Usage:
//! ```bash
//! # Analyze a photo
//! mealscan-cli analyze lunch.jpg --pretty
//!
//! # Analyze with known portion weights
//! mealscan-cli analyze lunch.jpg --weight "rice=180" --weight "chicken breast=150"
//!
//! # Resolve nutrition for a single food
//! mealscan-cli resolve "chicken breast" 150
//! ```

mod commands;
mod helpers;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use mealscan::analyzer::WeightHint;
use mealscan::logging::LoggingConfig;

use helpers::parse_weight_hint;

#[derive(Parser)]
#[command(
    name = "mealscan-cli",
    about = "Mealscan command-line tool",
    long_about = "Analyze meal photos and look up nutrition using the mealscan pipeline configured from the environment."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pretty: bool,
}

#[non_exhaustive]
#[derive(Subcommand)]
enum Command {
    /// Analyze a meal photo
    Analyze {
        /// JPEG, PNG or WebP file
        image: PathBuf,

        /// Known portion weight as `name=grams` (repeatable)
        #[arg(long = "weight", value_parser = parse_weight_hint)]
        weights: Vec<WeightHint>,

        /// Portion used for items without a weight estimate
        #[arg(long)]
        default_weight: Option<f64>,
    },

    /// Resolve nutrition for one food
    Resolve {
        /// Food name
        food: String,

        /// Portion weight in grams
        grams: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    LoggingConfig::for_cli(cli.verbose).init()?;

    match cli.command {
        Command::Analyze {
            image,
            weights,
            default_weight,
        } => commands::analyze::run(&image, weights, default_weight, cli.pretty).await,
        Command::Resolve { food, grams } => commands::resolve::run(&food, grams, cli.pretty).await,
    }
}
