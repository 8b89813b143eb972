//! Circuit breaker layer
//!
//! ```text
//! Closed → Open:      `threshold` consecutive rate-limited failures
//! Open → Half-Open:   cool-down elapsed; one trial call is admitted
//! Half-Open → Closed: trial succeeds
//! Half-Open → Open:   trial is rate-limited
//! ```
//!
//! Only rate-limited failures count. Other errors pass through without
//! touching the failure count; a trial that fails that way frees the
//! half-open slot for the next caller.

use super::ExecutionPolicy;
use crate::connector::ConnectorError;
use async_trait::async_trait;
use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitStatus {
    Closed,
    Open,
    HalfOpen,
}

#[derive(Debug, Clone, Copy)]
enum CircuitState {
    Closed { consecutive_failures: u32 },
    Open { until: Instant },
    HalfOpen { trial_in_flight: bool },
}

pub struct CircuitBreaker<P> {
    inner: P,
    threshold: u32,
    cooldown: Duration,
    state: Mutex<CircuitState>,
}

impl<P> CircuitBreaker<P> {
    pub fn new(inner: P, threshold: u32, cooldown: Duration) -> Self {
        Self {
            inner,
            threshold: threshold.max(1),
            cooldown,
            state: Mutex::new(CircuitState::Closed {
                consecutive_failures: 0,
            }),
        }
    }

    pub fn status(&self) -> CircuitStatus {
        match *self.lock() {
            CircuitState::Closed { .. } => CircuitStatus::Closed,
            CircuitState::Open { until } if Instant::now() >= until => CircuitStatus::HalfOpen,
            CircuitState::Open { .. } => CircuitStatus::Open,
            CircuitState::HalfOpen { .. } => CircuitStatus::HalfOpen,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CircuitState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Admit a call or reject it; `Ok(true)` marks the half-open trial.
    fn acquire(&self) -> Result<bool, ConnectorError> {
        let mut state = self.lock();
        match *state {
            CircuitState::Closed { .. } => Ok(false),
            CircuitState::Open { until } => {
                let now = Instant::now();
                if now >= until {
                    tracing::info!("Circuit half-open; admitting trial call");
                    *state = CircuitState::HalfOpen {
                        trial_in_flight: true,
                    };
                    Ok(true)
                } else {
                    Err(ConnectorError::circuit_open(until - now))
                }
            }
            CircuitState::HalfOpen {
                trial_in_flight: true,
            } => Err(ConnectorError::circuit_open(Duration::ZERO)),
            CircuitState::HalfOpen {
                trial_in_flight: false,
            } => {
                *state = CircuitState::HalfOpen {
                    trial_in_flight: true,
                };
                Ok(true)
            }
        }
    }

    fn record<T>(&self, trial: bool, result: &Result<T, ConnectorError>) {
        let mut state = self.lock();
        match result {
            Ok(_) => {
                if trial {
                    tracing::info!("Circuit closed after successful trial");
                }
                *state = CircuitState::Closed {
                    consecutive_failures: 0,
                };
            }
            Err(e) if e.is_rate_limited() => {
                let failures = match *state {
                    CircuitState::Closed {
                        consecutive_failures,
                    } if !trial => consecutive_failures + 1,
                    _ => self.threshold,
                };
                if failures >= self.threshold {
                    tracing::warn!(
                        failures,
                        cooldown_secs = self.cooldown.as_secs(),
                        "Circuit opened"
                    );
                    *state = CircuitState::Open {
                        until: Instant::now() + self.cooldown,
                    };
                } else {
                    tracing::debug!(failures, threshold = self.threshold, "Rate-limited failure recorded");
                    *state = CircuitState::Closed {
                        consecutive_failures: failures,
                    };
                }
            }
            Err(_) => {
                if trial {
                    *state = CircuitState::HalfOpen {
                        trial_in_flight: false,
                    };
                }
            }
        }
    }
}

#[async_trait]
impl<P: ExecutionPolicy> ExecutionPolicy for CircuitBreaker<P> {
    async fn execute<T, F, Fut>(&self, action: &F) -> Result<T, ConnectorError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ConnectorError>> + Send,
    {
        let trial = self.acquire()?;
        let result = self.inner.execute(action).await;
        self.record(trial, &result);
        result
    }
}
