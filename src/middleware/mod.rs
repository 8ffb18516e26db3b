// ABOUTME: HTTP middleware for the analysis server
// ABOUTME: Request ID propagation and structured access logging
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Request ID and access log middleware
pub mod request_log;

pub use request_log::{create_request_span, request_id_for, request_tracing, REQUEST_ID_HEADER};
