// ABOUTME: Circuit breaker guarding the nutrition cache store and authoritative database
// ABOUTME: Lets the resolver skip a known-down dependency for a cooldown window
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};

/// Externally visible breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Calls pass through
    Closed,
    /// Calls are refused until the cooldown ends
    Open,
    /// One recovery probe at a time
    HalfOpen,
}

impl CircuitState {
    /// Name used in logs and health reports
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::Open => "open",
            Self::HalfOpen => "half_open",
        }
    }
}

/// Thresholds for one breaker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CircuitBreakerConfig {
    /// Consecutive transient failures before the circuit opens
    pub failure_threshold: u32,
    /// Cooldown before a half-open probe is allowed
    pub recovery_timeout: Duration,
    /// Successful probes needed to close the circuit again
    pub success_threshold: u32,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self::new(5, Duration::from_secs(30), 1)
    }
}

impl CircuitBreakerConfig {
    /// Thresholds as given; zero counts behave like one
    #[must_use]
    pub const fn new(
        failure_threshold: u32,
        recovery_timeout: Duration,
        success_threshold: u32,
    ) -> Self {
        Self {
            failure_threshold,
            recovery_timeout,
            success_threshold,
        }
    }
}

/// State plus the bookkeeping each state needs
#[derive(Debug, Clone, Copy)]
enum Phase {
    Closed {
        failures: u32,
    },
    Open {
        since: Instant,
    },
    HalfOpen {
        successes: u32,
        /// Start of the probe in flight, if any
        probe: Option<Instant>,
    },
}

impl Phase {
    const fn state(&self) -> CircuitState {
        match self {
            Self::Closed { .. } => CircuitState::Closed,
            Self::Open { .. } => CircuitState::Open,
            Self::HalfOpen { .. } => CircuitState::HalfOpen,
        }
    }
}

/// Circuit breaker shared by all concurrent analyses
///
/// Closed counts consecutive transient failures and opens at the threshold.
/// Open refuses calls until `recovery_timeout` has passed, then the next
/// caller becomes the half-open probe. Half-open admits one probe at a time;
/// enough successes close the circuit and any failure re-opens it. A probe
/// whose caller vanished for longer than the cooldown is replaced.
pub struct CircuitBreaker {
    dependency: String,
    config: CircuitBreakerConfig,
    phase: Mutex<Phase>,
}

impl CircuitBreaker {
    /// Breaker with default thresholds
    #[must_use]
    pub fn new(dependency: &str) -> Self {
        Self::with_config(dependency, CircuitBreakerConfig::default())
    }

    /// Breaker with custom thresholds
    #[must_use]
    pub fn with_config(dependency: &str, config: CircuitBreakerConfig) -> Self {
        Self {
            dependency: dependency.to_owned(),
            config,
            phase: Mutex::new(Phase::Closed { failures: 0 }),
        }
    }

    // Critical sections never panic, so a poisoned lock still holds a valid phase
    fn phase(&self) -> MutexGuard<'_, Phase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Name of the guarded dependency
    #[must_use]
    pub fn dependency(&self) -> &str {
        &self.dependency
    }

    /// Current circuit state
    #[must_use]
    pub fn state(&self) -> CircuitState {
        self.phase().state()
    }

    /// Consecutive failures counted while closed
    #[must_use]
    pub fn failure_count(&self) -> u32 {
        match *self.phase() {
            Phase::Closed { failures } => failures,
            _ => 0,
        }
    }

    /// Whether a call may proceed right now
    ///
    /// Past the cooldown an open circuit turns half-open and the caller
    /// becomes the probe.
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        let now = Instant::now();
        let cooldown = self.config.recovery_timeout;
        let mut phase = self.phase();
        let current = *phase;
        match current {
            Phase::Closed { .. } => true,
            Phase::Open { since } if now.duration_since(since) >= cooldown => {
                *phase = Phase::HalfOpen {
                    successes: 0,
                    probe: Some(now),
                };
                info!(dependency = %self.dependency, "Circuit half-open, probing");
                true
            }
            Phase::Open { .. } => false,
            Phase::HalfOpen { successes, probe } => {
                let busy = probe.is_some_and(|started| now.duration_since(started) < cooldown);
                if !busy {
                    *phase = Phase::HalfOpen {
                        successes,
                        probe: Some(now),
                    };
                }
                !busy
            }
        }
    }

    /// Record a successful call
    pub fn record_success(&self) {
        let mut phase = self.phase();
        let current = *phase;
        match current {
            Phase::Closed { .. } => *phase = Phase::Closed { failures: 0 },
            Phase::HalfOpen { successes, .. } => {
                let successes = successes + 1;
                if successes >= self.config.success_threshold {
                    *phase = Phase::Closed { failures: 0 };
                    info!(dependency = %self.dependency, "Circuit closed, dependency recovered");
                } else {
                    *phase = Phase::HalfOpen {
                        successes,
                        probe: None,
                    };
                }
            }
            Phase::Open { .. } => {}
        }
    }

    /// Record a failed call
    pub fn record_failure(&self) {
        let now = Instant::now();
        let mut phase = self.phase();
        let current = *phase;
        match current {
            Phase::Closed { failures } => {
                let failures = failures + 1;
                if failures >= self.config.failure_threshold {
                    *phase = Phase::Open { since: now };
                    warn!(
                        dependency = %self.dependency,
                        failures,
                        cooldown_secs = self.config.recovery_timeout.as_secs(),
                        "Circuit opened"
                    );
                } else {
                    *phase = Phase::Closed { failures };
                }
            }
            Phase::HalfOpen { .. } => {
                *phase = Phase::Open { since: now };
                warn!(dependency = %self.dependency, "Recovery probe failed, circuit re-opened");
            }
            Phase::Open { .. } => *phase = Phase::Open { since: now },
        }
    }

    /// Run `operation` unless the circuit is open
    ///
    /// Only transient errors (see [`AppError::is_transient`]) count against
    /// the dependency; a definitive answer such as "not found" counts as a
    /// healthy response.
    ///
    /// # Errors
    ///
    /// Returns `ExternalServiceUnavailable` without running the operation when
    /// the circuit is open, otherwise the operation's own error.
    pub async fn call<F, T>(&self, operation: F) -> AppResult<T>
    where
        F: Future<Output = AppResult<T>>,
    {
        if !self.is_allowed() {
            debug!(dependency = %self.dependency, "Circuit open, skipping call");
            return Err(AppError::external_unavailable(
                &self.dependency,
                format!(
                    "circuit open, retry in {}s",
                    self.time_until_recovery_secs()
                ),
            ));
        }

        let outcome = operation.await;
        match &outcome {
            Err(e) if e.is_transient() => self.record_failure(),
            _ => self.record_success(),
        }
        outcome
    }

    /// Whole seconds until an open circuit admits a probe, rounded up
    #[must_use]
    pub fn time_until_recovery_secs(&self) -> u64 {
        let Phase::Open { since } = *self.phase() else {
            return 0;
        };
        let remaining = self.config.recovery_timeout.saturating_sub(since.elapsed());
        remaining.as_secs() + u64::from(remaining.subsec_nanos() > 0)
    }

    /// Force the circuit closed
    pub fn reset(&self) {
        *self.phase() = Phase::Closed { failures: 0 };
        info!(dependency = %self.dependency, "Circuit reset to closed");
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("dependency", &self.dependency)
            .field("phase", &*self.phase())
            .finish_non_exhaustive()
    }
}
