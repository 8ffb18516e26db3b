// ABOUTME: Health check route handlers for service monitoring and status endpoints
// ABOUTME: Liveness reports the process is up; readiness probes the nutrition cache backend
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Health check routes for load balancers and orchestrators

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde_json::json;

use crate::server::ServerResources;

/// Health routes implementation
pub struct HealthRoutes;

impl HealthRoutes {
    /// Create all health check routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/health", get(Self::health_handler))
            .route("/ready", get(Self::ready_handler))
            .with_state(resources)
    }

    async fn health_handler() -> Json<serde_json::Value> {
        Json(json!({
            "status": "healthy",
            "service": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339()
        }))
    }

    async fn ready_handler(
        State(resources): State<Arc<ServerResources>>,
    ) -> (StatusCode, Json<serde_json::Value>) {
        let resolver = resources.analyzer.resolver();
        let cache = match resolver.cache().health_check().await {
            Ok(()) => json!({ "status": "ok" }),
            Err(e) => json!({ "status": "unavailable", "error": e.to_string() }),
        };
        let cache_ok = cache["status"] == "ok";

        let body = json!({
            "status": if cache_ok { "ready" } else { "degraded" },
            "cache": cache,
            "breakers": {
                "nutrition_cache": resolver.cache_breaker().state().as_str(),
                "nutrition_database": resolver.database_breaker().state().as_str(),
            },
            "timestamp": chrono::Utc::now().to_rfc3339()
        });
        let status = if cache_ok {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        };
        (status, Json(body))
    }
}
