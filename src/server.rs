// ABOUTME: HTTP server assembly: shared resources, router with tracing and body limits, serve loop
// ABOUTME: Graceful shutdown on ctrl-c, then waits for queued cache backfill to drain
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::analyzer::MealAnalyzer;
use crate::config::ServerConfig;
use crate::errors::{AppError, AppResult};
use crate::middleware::request_tracing;
use crate::routes::{AnalysisRoutes, HealthRoutes};

/// State shared by every request handler
#[derive(Debug)]
pub struct ServerResources {
    /// The analysis pipeline
    pub analyzer: MealAnalyzer,
    /// Loaded configuration
    pub config: Arc<ServerConfig>,
}

impl ServerResources {
    /// Bundle the analyzer with its configuration
    #[must_use]
    pub fn new(analyzer: MealAnalyzer, config: Arc<ServerConfig>) -> Self {
        Self { analyzer, config }
    }
}

/// Build the full application router
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let max_body_bytes = resources.config.max_body_bytes;
    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AnalysisRoutes::routes(resources))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(max_body_bytes))
        .layer(middleware::from_fn(request_tracing))
        .layer(TraceLayer::new_for_http())
}

/// Build the pipeline from `config` and serve until ctrl-c
///
/// # Errors
///
/// Returns an error if the pipeline cannot be built or the listener cannot bind.
pub async fn run(config: ServerConfig) -> AppResult<()> {
    let config = Arc::new(config);
    let (analyzer, backfill_task) = MealAnalyzer::from_config(&config).await?;
    let resources = Arc::new(ServerResources::new(analyzer, config.clone()));
    let app = build_router(resources);

    let addr: SocketAddr = format!("{}:{}", config.host, config.http_port)
        .parse()
        .map_err(|e| AppError::config(format!("Invalid bind address: {e}")))?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {addr}: {e}")).with_source(e))?;
    info!("Meal analysis server listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::internal(format!("Server error: {e}")).with_source(e))?;

    // the router (and with it every resolver clone) is gone, so the worker drains and exits
    match backfill_task.await {
        Ok(stats) => info!(
            written = stats.written,
            failed = stats.failed,
            "Cache backfill drained"
        ),
        Err(e) => warn!(error = %e, "Backfill worker ended abnormally"),
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
