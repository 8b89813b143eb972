//! Layered resilience policy for outbound connector calls
//!
//! Three decorators over one [`ExecutionPolicy`] capability, innermost first:
//! - transient [`Retry`] of rate-limited failures with jittered exponential backoff
//! - [`CircuitBreaker`] counting rate-limited failures that escape the retry
//! - outer [`Retry`] that waits out an open circuit on a fixed delay
//!
//! The composed policy is an ordinary value: build it once and hand it to
//! whoever dispatches calls.

mod backoff;
mod circuit_breaker;
mod retry;

pub use backoff::{Backoff, Jitter};
pub use circuit_breaker::{CircuitBreaker, CircuitStatus};
pub use retry::{Retry, RetryOn};

use crate::config::PolicyConfig;
use crate::connector::ConnectorError;
use async_trait::async_trait;
use std::future::Future;

/// Runs a zero-argument async action, possibly more than once
#[async_trait]
pub trait ExecutionPolicy: Send + Sync {
    async fn execute<T, F, Fut>(&self, action: &F) -> Result<T, ConnectorError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ConnectorError>> + Send;
}

/// Innermost policy: run the action exactly once
pub struct Passthrough;

#[async_trait]
impl ExecutionPolicy for Passthrough {
    async fn execute<T, F, Fut>(&self, action: &F) -> Result<T, ConnectorError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ConnectorError>> + Send,
    {
        action().await
    }
}

pub type ResiliencePolicy = Retry<CircuitBreaker<Retry<Passthrough>>>;

/// Outer retry → circuit breaker → transient retry → action
pub fn compose(config: &PolicyConfig, jitter: Jitter) -> ResiliencePolicy {
    let transient = Retry::new(
        "transient",
        Passthrough,
        RetryOn::RateLimited,
        config.transient_retries,
        Backoff::Exponential {
            base: config.transient_base_delay,
            jitter,
        },
    )
    .honoring_retry_after(config.breaker_cooldown);

    let breaker = CircuitBreaker::new(transient, config.breaker_threshold, config.breaker_cooldown);

    Retry::new(
        "circuit",
        breaker,
        RetryOn::CircuitOpen,
        config.outer_retries,
        Backoff::Fixed(config.outer_delay),
    )
}
