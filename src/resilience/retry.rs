//! Retry layer

use super::{Backoff, ExecutionPolicy};
use crate::connector::ConnectorError;
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

/// Which failures a retry layer handles; anything else propagates untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryOn {
    RateLimited,
    CircuitOpen,
}

impl RetryOn {
    fn matches(self, error: &ConnectorError) -> bool {
        match self {
            RetryOn::RateLimited => error.is_rate_limited(),
            RetryOn::CircuitOpen => error.is_circuit_open(),
        }
    }
}

/// Re-runs the inner policy on matching failures
pub struct Retry<P> {
    inner: P,
    name: &'static str,
    retry_on: RetryOn,
    max_retries: u32,
    backoff: Backoff,
    /// Honor server `Retry-After` hints up to this bound
    retry_after_cap: Option<Duration>,
}

impl<P> Retry<P> {
    pub fn new(
        name: &'static str,
        inner: P,
        retry_on: RetryOn,
        max_retries: u32,
        backoff: Backoff,
    ) -> Self {
        Self {
            inner,
            name,
            retry_on,
            max_retries,
            backoff,
            retry_after_cap: None,
        }
    }

    #[must_use]
    pub fn honoring_retry_after(mut self, cap: Duration) -> Self {
        self.retry_after_cap = Some(cap);
        self
    }

    pub fn inner(&self) -> &P {
        &self.inner
    }

    fn delay(&self, attempt: u32, error: &ConnectorError) -> Duration {
        let computed = self.backoff.delay_for_attempt(attempt);
        match (self.retry_after_cap, error.retry_after) {
            (Some(cap), Some(hint)) => computed.max(hint.min(cap)),
            _ => computed,
        }
    }
}

#[async_trait]
impl<P: ExecutionPolicy> ExecutionPolicy for Retry<P> {
    async fn execute<T, F, Fut>(&self, action: &F) -> Result<T, ConnectorError>
    where
        T: Send,
        F: Fn() -> Fut + Send + Sync,
        Fut: Future<Output = Result<T, ConnectorError>> + Send,
    {
        let mut retries = 0;
        loop {
            match self.inner.execute(action).await {
                Ok(value) => return Ok(value),
                Err(e) if self.retry_on.matches(&e) && retries < self.max_retries => {
                    retries += 1;
                    let delay = self.delay(retries, &e);
                    tracing::warn!(
                        layer = self.name,
                        attempt = retries,
                        max_retries = self.max_retries,
                        delay_ms = %delay.as_millis(),
                        error = %e,
                        "Retrying after failure"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if self.retry_on.matches(&e) {
                        tracing::debug!(layer = self.name, retries, "Retries exhausted");
                    }
                    return Err(e);
                }
            }
        }
    }
}
