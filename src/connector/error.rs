//! Connector error types

use std::time::Duration;
use thiserror::Error;

/// Connector error with classification
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct ConnectorError {
    pub kind: ConnectorErrorKind,
    pub message: String,
    pub retry_after: Option<Duration>,
}

impl ConnectorError {
    pub fn new(kind: ConnectorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retry_after: None,
        }
    }

    #[must_use]
    pub fn with_retry_after(mut self, duration: Duration) -> Self {
        self.retry_after = Some(duration);
        self
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::Network, message)
    }

    pub fn rate_limited(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::RateLimited, message)
    }

    /// Rejection produced locally by an open circuit breaker.
    pub fn circuit_open(remaining: Duration) -> Self {
        Self::new(
            ConnectorErrorKind::CircuitOpen,
            format!("Circuit open; retry in {}s", remaining.as_secs()),
        )
        .with_retry_after(remaining)
    }

    pub fn server_error(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::ServerError, message)
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::Auth, message)
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::InvalidRequest, message)
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ConnectorErrorKind::Unknown, message)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.kind == ConnectorErrorKind::RateLimited
    }

    pub fn is_circuit_open(&self) -> bool {
        self.kind == ConnectorErrorKind::CircuitOpen
    }
}

/// Error classification for the resilience policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectorErrorKind {
    /// Network issues, timeouts
    Network,
    /// Throttled by the endpoint (429)
    RateLimited,
    /// Rejected locally because the circuit breaker is open
    CircuitOpen,
    /// Server error (5xx)
    ServerError,
    /// Token acquisition failed, 401/403, or untrusted service URL
    Auth,
    /// Bad request (400) or unknown conversation (404)
    InvalidRequest,
    /// Unknown error
    Unknown,
}

impl ConnectorErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Network => "network",
            Self::RateLimited => "rate_limited",
            Self::CircuitOpen => "circuit_open",
            Self::ServerError => "server_error",
            Self::Auth => "auth",
            Self::InvalidRequest => "invalid_request",
            Self::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circuit_open_carries_remaining_window() {
        let err = ConnectorError::circuit_open(Duration::from_secs(90));
        assert!(err.is_circuit_open());
        assert!(!err.is_rate_limited());
        assert_eq!(err.retry_after, Some(Duration::from_secs(90)));
        assert_eq!(err.to_string(), "Circuit open; retry in 90s");
    }

    #[test]
    fn test_rate_limited_predicate() {
        assert!(ConnectorError::rate_limited("slow down").is_rate_limited());
        assert!(!ConnectorError::auth("denied").is_rate_limited());
    }
}
