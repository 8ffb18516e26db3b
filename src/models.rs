// ABOUTME: Re-export of food, nutrition and meal models from mealscan-core
// ABOUTME: Keeps crate::models paths stable for internal modules and binaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

pub use mealscan_core::models::*;
