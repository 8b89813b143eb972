//! Runtime configuration
//!
//! Credentials come from the command line (or `MICROSOFT_APP_*` through
//! clap); everything here has a default and an environment override.

use std::str::FromStr;
use std::time::Duration;

const DEFAULT_OAUTH_ENDPOINT: &str =
    "https://login.microsoftonline.com/botframework.com/oauth2/v2.0/token";
const DEFAULT_OAUTH_SCOPE: &str = "https://api.botframework.com/.default";

/// Token endpoint and HTTP settings for the connector client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectorConfig {
    pub oauth_endpoint: String,
    pub oauth_scope: String,
    pub request_timeout: Duration,
}

impl Default for ConnectorConfig {
    fn default() -> Self {
        Self {
            oauth_endpoint: DEFAULT_OAUTH_ENDPOINT.to_string(),
            oauth_scope: DEFAULT_OAUTH_SCOPE.to_string(),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl ConnectorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            oauth_endpoint: get("BOT_OAUTH_ENDPOINT")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.oauth_endpoint),
            oauth_scope: get("BOT_OAUTH_SCOPE")
                .filter(|v| !v.trim().is_empty())
                .unwrap_or(defaults.oauth_scope),
            request_timeout: Duration::from_secs(parse_or(
                &get,
                "BOT_REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )),
        }
    }
}

/// Tuning for the layered resilience policy
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyConfig {
    /// Retries after the first rate-limited attempt
    pub transient_retries: u32,
    /// Backoff for the first retry; doubles per attempt
    pub transient_base_delay: Duration,
    /// Upper bound of the random jitter added to each backoff
    pub jitter_max: Duration,
    /// Consecutive rate-limited failures that open the circuit
    pub breaker_threshold: u32,
    pub breaker_cooldown: Duration,
    /// Retries of the whole operation while the circuit is open
    pub outer_retries: u32,
    pub outer_delay: Duration,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            transient_retries: 3,
            transient_base_delay: Duration::from_secs(2),
            jitter_max: Duration::from_millis(1000),
            breaker_threshold: 5,
            breaker_cooldown: Duration::from_secs(10 * 60),
            outer_retries: 5,
            outer_delay: Duration::from_secs(10 * 60),
        }
    }
}

impl PolicyConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Self {
        let d = Self::default();
        Self {
            transient_retries: parse_or(&get, "TEAMS_TRANSIENT_RETRIES", d.transient_retries),
            transient_base_delay: Duration::from_secs(parse_or(
                &get,
                "TEAMS_TRANSIENT_BASE_DELAY_SECS",
                d.transient_base_delay.as_secs(),
            )),
            jitter_max: Duration::from_millis(parse_or(
                &get,
                "TEAMS_JITTER_MAX_MS",
                u64::try_from(d.jitter_max.as_millis()).unwrap_or(1000),
            )),
            // A zero threshold would open the circuit without a failure
            breaker_threshold: parse_or(&get, "TEAMS_BREAKER_THRESHOLD", d.breaker_threshold)
                .max(1),
            breaker_cooldown: Duration::from_secs(parse_or(
                &get,
                "TEAMS_BREAKER_COOLDOWN_SECS",
                d.breaker_cooldown.as_secs(),
            )),
            outer_retries: parse_or(&get, "TEAMS_OUTER_RETRIES", d.outer_retries),
            outer_delay: Duration::from_secs(parse_or(
                &get,
                "TEAMS_OUTER_DELAY_SECS",
                d.outer_delay.as_secs(),
            )),
        }
    }
}

fn parse_or<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match get(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "Ignoring unparseable setting");
            default
        }),
        None => default,
    }
}
