// ABOUTME: Redis connection defaults for the nutrition cache backend
// ABOUTME: Timeouts, retry counts, and exponential backoff parameters
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Connection timeout in seconds
pub const CONNECTION_TIMEOUT_SECS: u64 = 5;

/// Per-command response timeout in seconds
pub const RESPONSE_TIMEOUT_SECS: u64 = 3;

/// Reconnection attempts after a dropped connection
pub const RECONNECTION_RETRIES: usize = 3;

/// Exponential backoff base
pub const RETRY_EXPONENT_BASE: u64 = 2;

/// Maximum backoff delay in milliseconds
pub const MAX_RETRY_DELAY_MS: u64 = 5_000;

/// Attempts at startup before giving up
pub const INITIAL_CONNECTION_RETRIES: u32 = 3;

/// First retry delay in milliseconds (doubles each attempt)
pub const INITIAL_RETRY_DELAY_MS: u64 = 500;
