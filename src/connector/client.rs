//! HTTP client for the bot connector REST API

use super::types::{
    Activity, ConversationParameters, ConversationResourceResponse, ResourceResponse,
};
use super::{AppCredentials, ConnectorError, ConnectorService};
use crate::config::ConnectorConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Connector client bound to one service URL
pub struct BotConnectorClient {
    client: Client,
    credentials: Arc<AppCredentials>,
    service_url: Url,
}

impl BotConnectorClient {
    pub fn new(
        service_url: &str,
        credentials: Arc<AppCredentials>,
        config: &ConnectorConfig,
    ) -> Result<Self, ConnectorError> {
        let service_url = Url::parse(service_url).map_err(|e| {
            ConnectorError::invalid_request(format!("Invalid service URL '{service_url}': {e}"))
        })?;
        if service_url.cannot_be_a_base() {
            return Err(ConnectorError::invalid_request(format!(
                "Service URL '{service_url}' cannot carry a path"
            )));
        }

        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ConnectorError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            credentials,
            service_url,
        })
    }

    /// `{service_url}/v3/conversations[/{segments}...]`
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.service_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().push("v3").push("conversations");
            for segment in segments {
                path.push(segment);
            }
        }
        url
    }

    async fn post<B, R>(&self, url: Url, body: &B) -> Result<R, ConnectorError>
    where
        B: Serialize + Sync,
        R: DeserializeOwned,
    {
        if !self.credentials.is_trusted(self.service_url.as_str()) {
            return Err(ConnectorError::auth(format!(
                "Service URL {} is not trusted for app {}",
                self.service_url,
                self.credentials.app_id()
            )));
        }

        let token = self.credentials.token(&self.client).await?;

        let response = self
            .client
            .post(url)
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ConnectorError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    ConnectorError::network(format!("Connection failed: {e}"))
                } else {
                    ConnectorError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let retry_after = parse_retry_after(response.headers());
        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::network(format!("Failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(classify_error(status, &body, retry_after));
        }

        serde_json::from_str(&body).map_err(|e| {
            ConnectorError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })
    }
}

#[async_trait]
impl ConnectorService for BotConnectorClient {
    fn trust_endpoint(&self) {
        self.credentials.trust_service_url(self.service_url.as_str());
    }

    async fn send_to_conversation(
        &self,
        conversation_id: &str,
        activity: &Activity,
    ) -> Result<ResourceResponse, ConnectorError> {
        let url = self.endpoint(&[conversation_id, "activities"]);
        self.post(url, activity).await
    }

    async fn create_conversation(
        &self,
        params: &ConversationParameters,
    ) -> Result<ConversationResourceResponse, ConnectorError> {
        let url = self.endpoint(&[]);
        self.post(url, params).await
    }

    fn service_url(&self) -> &str {
        self.service_url.as_str()
    }
}

fn classify_error(status: StatusCode, body: &str, retry_after: Option<Duration>) -> ConnectorError {
    match status.as_u16() {
        401 | 403 => ConnectorError::auth(format!("Authentication failed: {body}")),
        429 => {
            let err = ConnectorError::rate_limited(format!("Rate limited: {body}"));
            match retry_after {
                Some(delay) => err.with_retry_after(delay),
                None => err,
            }
        }
        400 | 404 => ConnectorError::invalid_request(format!("Invalid request ({status}): {body}")),
        500..=599 => ConnectorError::server_error(format!("Server error ({status}): {body}")),
        _ => ConnectorError::unknown(format!("HTTP {status}: {body}")),
    }
}

/// Only the delta-seconds form; HTTP dates are ignored
fn parse_retry_after(headers: &reqwest::header::HeaderMap) -> Option<Duration> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}
