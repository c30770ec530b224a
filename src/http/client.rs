//! HTTP client with retry and rate limiting
//!
//! Provides the single primitive the extractor needs from the network:
//! `get(path, query) -> JSON object`. It handles:
//! - The PagerDuty header set (versioned media type, token, `From` actor)
//! - Client-side rate limiting
//! - Automatic retries driven by [`RetryPolicy`]
//! - Error classification for retry decisions

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use super::retry::RetryPolicy;
use crate::error::{Error, Result};
use crate::types::{JsonObject, JsonValue};
use reqwest::{Client, Response, StatusCode};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// Default API root
pub const DEFAULT_BASE_URL: &str = "https://api.pagerduty.com";

/// Versioned media type of the REST API v2
pub const PAGERDUTY_MEDIA_TYPE: &str = "application/vnd.pagerduty+json;version=2";

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Base URL for all requests
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Retry/backoff policy
    pub retry: RetryPolicy,
    /// Rate limiter configuration
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: BTreeMap<String, String>,
    /// User agent string
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        let mut default_headers = BTreeMap::new();
        default_headers.insert("Accept".to_string(), PAGERDUTY_MEDIA_TYPE.to_string());
        default_headers.insert("Content-Type".to_string(), "application/json".to_string());

        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers,
            user_agent: format!("tap-pagerduty/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Create a new config builder
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for HTTP client config
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    /// Set the base URL
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = url.into();
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the retry policy
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Set rate limiter
    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    /// Disable rate limiting
    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    /// Add a default header
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    /// Authenticate with an API token (`Authorization: Token token=<token>`)
    pub fn token(self, token: &str) -> Self {
        self.header("Authorization", format!("Token token={token}"))
    }

    /// Identify the acting user (`From: <email>`), required for audit trails
    pub fn actor_email(self, email: &str) -> Self {
        self.header("From", email)
    }

    /// Set user agent
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    /// Build the config
    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

/// A failed attempt plus the server's requested wait, if any
struct Failure {
    error: Error,
    retry_after: Option<Duration>,
}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self {
            error,
            retry_after: None,
        }
    }
}

/// HTTP client with retry and rate limiting
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    /// Create a new HTTP client with custom configuration
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        Url::parse(&config.base_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;

        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// GET a JSON object, retrying transient failures
    ///
    /// Fatal statuses (4xx other than 429) return immediately. Transient
    /// failures are retried until the policy's time budget runs out, after
    /// which [`Error::RetriesExhausted`] carries the last failure.
    pub async fn get(&self, path: &str, query: &[(String, String)]) -> Result<JsonObject> {
        let url = self.build_url(path)?;
        let policy = &self.config.retry;
        let start = Instant::now();
        let mut attempt = 0u32;

        loop {
            if let Some(ref limiter) = self.rate_limiter {
                limiter.wait().await;
            }
            attempt += 1;

            let failure = match self.send_once(&url, query).await {
                Ok(body) => {
                    debug!(url = %url, attempt, "Request succeeded");
                    return Ok(body);
                }
                Err(failure) => failure,
            };

            if !policy.should_retry(&failure.error) {
                return Err(failure.error);
            }

            let Some(delay) =
                policy.delay_within_budget(attempt, start.elapsed(), failure.retry_after)
            else {
                return Err(Error::RetriesExhausted {
                    attempts: attempt,
                    elapsed: start.elapsed(),
                    last: Box::new(failure.error),
                });
            };

            warn!(
                url = %url,
                attempt,
                status = ?failure.error.status(),
                wait_ms = delay.as_millis() as u64,
                "Request failed, retrying: {}",
                failure.error
            );
            tokio::time::sleep(delay).await;
        }
    }

    /// One request/response exchange, without retries
    async fn send_once(
        &self,
        url: &Url,
        query: &[(String, String)],
    ) -> std::result::Result<JsonObject, Failure> {
        let mut req = self.client.get(url.clone());
        for (key, value) in &self.config.default_headers {
            req = req.header(key.as_str(), value.as_str());
        }
        if !query.is_empty() {
            req = req.query(query);
        }

        let response = req.send().await.map_err(Error::Http)?;
        let status = response.status();

        if !status.is_success() {
            let retry_after = if status == StatusCode::TOO_MANY_REQUESTS {
                extract_retry_after(&response)
            } else {
                None
            };
            let body = response.text().await.unwrap_or_default();
            return Err(Failure {
                error: Error::http_status(status.as_u16(), body),
                retry_after,
            });
        }

        // A body cut off in transit stays a transport error and is retried
        let bytes = response.bytes().await.map_err(Error::Http)?;
        let body: JsonValue = serde_json::from_slice(&bytes)
            .map_err(|e| Error::malformed(format!("response from {url} is not JSON: {e}")))?;

        match body {
            JsonValue::Object(map) => Ok(map),
            other => Err(Error::malformed(format!(
                "response from {url} is not a JSON object: {other}"
            ))
            .into()),
        }
    }

    /// Build full URL from path
    fn build_url(&self, path: &str) -> Result<Url> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Ok(Url::parse(path)?);
        }

        let base = self.config.base_url.trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("base_url", &self.config.base_url)
            .field("retry", &self.config.retry)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract a numeric `Retry-After` header (seconds)
fn extract_retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}
