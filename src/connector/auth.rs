//! Bot credentials: OAuth client-credentials tokens and service URL trust

use super::ConnectorError;
use crate::config::ConnectorConfig;
use reqwest::{Client, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Refresh this long before the token actually expires
const EXPIRY_MARGIN: Duration = Duration::from_secs(5 * 60);

struct CachedToken {
    access_token: String,
    expires_at: Instant,
}

/// Application id/password pair plus the hosts its tokens may be sent to
pub struct AppCredentials {
    app_id: String,
    app_password: SecretString,
    oauth_endpoint: String,
    oauth_scope: String,
    trusted_hosts: Mutex<HashSet<String>>,
    token: tokio::sync::Mutex<Option<CachedToken>>,
}

impl AppCredentials {
    pub fn new(app_id: impl Into<String>, app_password: SecretString, config: &ConnectorConfig) -> Self {
        Self {
            app_id: app_id.into(),
            app_password,
            oauth_endpoint: config.oauth_endpoint.clone(),
            oauth_scope: config.oauth_scope.clone(),
            trusted_hosts: Mutex::new(HashSet::new()),
            token: tokio::sync::Mutex::new(None),
        }
    }

    pub fn app_id(&self) -> &str {
        &self.app_id
    }

    /// Allow tokens to be attached to requests for this service URL's host.
    pub fn trust_service_url(&self, service_url: &str) {
        if let Some(key) = trust_key(service_url) {
            tracing::debug!(host = %key, "Trusting service URL");
            self.trusted_hosts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .insert(key);
        }
    }

    pub fn is_trusted(&self, service_url: &str) -> bool {
        trust_key(service_url).is_some_and(|key| {
            self.trusted_hosts
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .contains(&key)
        })
    }

    /// Current bearer token, fetching a new one when missing or near expiry.
    pub async fn token(&self, client: &Client) -> Result<String, ConnectorError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.expires_at {
                return Ok(token.access_token.clone());
            }
        }

        let fresh = self.fetch_token(client).await?;
        let access_token = fresh.access_token.clone();
        *cached = Some(fresh);
        Ok(access_token)
    }

    async fn fetch_token(&self, client: &Client) -> Result<CachedToken, ConnectorError> {
        tracing::debug!(app_id = %self.app_id, endpoint = %self.oauth_endpoint, "Requesting bot token");

        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.app_id.as_str()),
            ("client_secret", self.app_password.expose_secret().as_str()),
            ("scope", self.oauth_scope.as_str()),
        ];

        let response = client
            .post(&self.oauth_endpoint)
            .form(&form)
            .send()
            .await
            .map_err(|e| ConnectorError::network(format!("Token request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ConnectorError::network(format!("Failed to read token response: {e}")))?;

        if !status.is_success() {
            return Err(match status.as_u16() {
                429 => ConnectorError::rate_limited(format!("Token endpoint throttled: {body}")),
                500..=599 => ConnectorError::server_error(format!("Token endpoint error: {body}")),
                _ => ConnectorError::auth(format!("Token request rejected ({status}): {body}")),
            });
        }

        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| ConnectorError::auth(format!("Malformed token response: {e}")))?;

        let lifetime = Duration::from_secs(parsed.expires_in).saturating_sub(EXPIRY_MARGIN);
        Ok(CachedToken {
            access_token: parsed.access_token,
            expires_at: Instant::now() + lifetime,
        })
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_expires_in")]
    expires_in: u64,
}

fn default_expires_in() -> u64 {
    3600
}

/// Trust is keyed by scheme and authority, so paths under one host share it
fn trust_key(service_url: &str) -> Option<String> {
    let url = Url::parse(service_url).ok()?;
    let host = url.host_str()?.to_ascii_lowercase();
    Some(match url.port() {
        Some(port) => format!("{}://{host}:{port}", url.scheme()),
        None => format!("{}://{host}", url.scheme()),
    })
}
