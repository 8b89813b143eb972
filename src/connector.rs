//! Bot connector abstraction
//!
//! The two REST operations the dispatcher needs, behind a trait so the
//! resilience policy and dispatcher can be exercised without a network.

mod auth;
mod client;
mod error;
mod types;

pub use auth::AppCredentials;
pub use client::BotConnectorClient;
pub use error::{ConnectorError, ConnectorErrorKind};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;

/// Common interface for the bot connector
#[async_trait]
pub trait ConnectorService: Send + Sync {
    /// Mark this client's service URL as trusted for its credentials
    fn trust_endpoint(&self);

    /// Post an activity into an existing conversation or channel thread
    async fn send_to_conversation(
        &self,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError>;

    /// Start a new conversation (a new thread when scoped to a channel)
    async fn create_conversation(
        &self,
        params: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError>;

    fn service_url(&self) -> &str;
}

/// Logging wrapper for connector services
pub struct LoggingService {
    inner: Arc<dyn ConnectorService>,
}

impl LoggingService {
    pub fn new(inner: Arc<dyn ConnectorService>) -> Self {
        Self { inner }
    }

    fn log_outcome<T>(
        &self,
        operation: &'static str,
        destination: &str,
        started: std::time::Instant,
        result: &Result<T, ConnectorError>,
    ) {
        let duration = started.elapsed();
        match result {
            Ok(_) => {
                tracing::info!(
                    operation,
                    destination,
                    service_url = %self.inner.service_url(),
                    duration_ms = %duration.as_millis(),
                    "Connector request completed"
                );
            }
            Err(e) => {
                tracing::warn!(
                    operation,
                    destination,
                    service_url = %self.inner.service_url(),
                    duration_ms = %duration.as_millis(),
                    kind = e.kind.as_str(),
                    error = %e.message,
                    "Connector request failed"
                );
            }
        }
    }
}

#[async_trait]
impl ConnectorService for LoggingService {
    fn trust_endpoint(&self) {
        self.inner.trust_endpoint();
    }

    async fn send_to_conversation(
        &self,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError> {
        let started = std::time::Instant::now();
        let result = self.inner.send_to_conversation(conversation_id, activity).await;
        self.log_outcome("send_to_conversation", conversation_id, started, &result);
        result
    }

    async fn create_conversation(
        &self,
        params: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError> {
        let started = std::time::Instant::now();
        let result = self.inner.create_conversation(params).await;
        self.log_outcome(
            "create_conversation",
            params.channel_id().unwrap_or_default(),
            started,
            &result,
        );
        result
    }

    fn service_url(&self) -> &str {
        self.inner.service_url()
    }
}
