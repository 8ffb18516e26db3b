// ABOUTME: Logging configuration and structured tracing setup for the mealscan service
// ABOUTME: Reads level/format from the environment and installs the global subscriber
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

//! Structured logging
//!
//! | Variable | Effect |
//! |---|---|
//! | `RUST_LOG` | filter directives, default `info` |
//! | `LOG_FORMAT` | `json`, `compact`, anything else is pretty |
//! | `ENVIRONMENT` | `production` turns on source locations |
//! | `LOG_INCLUDE_LOCATION` | source file and line on every event |
//! | `LOG_INCLUDE_SPANS` | span open/close events |
//! | `SERVICE_NAME` | `service` field of the startup event, default `mealscan` |

use std::env;
use std::io;
use std::time::Duration;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer, Registry,
};

use crate::models::{DetectionRoute, NutritionTier};

/// Dependencies that are chatty at `info`
const QUIET_TARGETS: [&str; 4] = ["hyper=warn", "reqwest=warn", "redis=warn", "tower_http=info"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event
    Json,
    /// Multi-field human format
    Pretty,
    /// Single-line human format
    Compact,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset
    pub level: String,
    /// Output format
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Write to stderr so stdout stays machine-readable
    pub use_stderr: bool,
    /// Deployment environment name
    pub environment: String,
    /// Reported as `service` on the startup event
    pub service_name: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            use_stderr: false,
            environment: "development".into(),
            service_name: "mealscan".into(),
        }
    }
}

impl LoggingConfig {
    /// Server logging from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };
        Self {
            level: env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
            format,
            include_location: environment == "production"
                || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            use_stderr: false,
            environment,
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| "mealscan".into()),
        }
    }

    /// Quiet compact logging on stderr for the command-line tool
    #[must_use]
    pub fn for_cli(verbose: bool) -> Self {
        Self {
            level: if verbose { "debug" } else { "warn" }.into(),
            format: LogFormat::Compact,
            use_stderr: true,
            ..Self::default()
        }
    }

    fn env_filter(&self) -> EnvFilter {
        let directives = env::var("RUST_LOG").unwrap_or_else(|_| self.level.clone());
        QUIET_TARGETS
            .iter()
            .filter_map(|directive| directive.parse().ok())
            .fold(EnvFilter::new(directives), EnvFilter::add_directive)
    }

    fn output_layer(&self) -> Box<dyn Layer<Registry> + Send + Sync> {
        let use_stderr = self.use_stderr;
        let writer = move || -> Box<dyn io::Write> {
            if use_stderr {
                Box::new(io::stderr())
            } else {
                Box::new(io::stdout())
            }
        };
        let spans = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };
        let base = fmt::layer()
            .with_writer(writer)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_span_events(spans);

        match self.format {
            LogFormat::Json => base.json().boxed(),
            LogFormat::Pretty => base.boxed(),
            LogFormat::Compact => base.compact().with_target(false).boxed(),
        }
    }

    /// Install the global subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        tracing_subscriber::registry()
            .with(self.output_layer())
            .with(self.env_filter())
            .try_init()?;

        info!(
            service = %self.service_name,
            service.version = env!("CARGO_PKG_VERSION"),
            environment = %self.environment,
            log.format = ?self.format,
            "logging initialized"
        );
        Ok(())
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// Structured log events for the analysis pipeline
pub struct AppLogger;

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

impl AppLogger {
    /// Log a completed meal analysis
    pub fn log_analysis(route: DetectionRoute, items: usize, confidence: f64, elapsed: Duration) {
        info!(
            analysis.route = route.as_str(),
            analysis.items = items,
            analysis.confidence = confidence,
            analysis.duration_ms = millis(elapsed),
            "Meal analysis completed"
        );
    }

    /// Log a nutrition resolution
    pub fn log_resolution(food: &str, weight_grams: f64, tier: NutritionTier, elapsed: Duration) {
        info!(
            food = %food,
            weight_grams,
            tier = tier.as_str(),
            duration_ms = millis(elapsed),
            "Nutrition resolved"
        );
    }

    /// Log an HTTP request
    pub fn log_api_request(method: &str, path: &str, status: u16, elapsed: Duration) {
        info!(
            http.method = %method,
            http.path = %path,
            http.status = status,
            http.duration_ms = millis(elapsed),
            "HTTP request"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_logging_is_quiet_unless_verbose() {
        let quiet = LoggingConfig::for_cli(false);
        assert_eq!(quiet.level, "warn");
        assert_eq!(quiet.format, LogFormat::Compact);
        assert!(quiet.use_stderr);

        assert_eq!(LoggingConfig::for_cli(true).level, "debug");
    }
}
