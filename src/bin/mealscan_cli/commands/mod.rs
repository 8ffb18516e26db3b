// ABOUTME: Command modules for mealscan-cli
// ABOUTME: Photo analysis and single-food nutrition resolution
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub mod analyze;
pub mod resolve;
