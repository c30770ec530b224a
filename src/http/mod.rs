//! HTTP client module
//!
//! Provides the authenticated, throttled, retrying GET primitive the
//! extractor is built on.
//!
//! # Features
//!
//! - **Automatic Retries**: Transient failures (network, 429, 5xx) retried with backoff
//! - **Fatal Classification**: Other 4xx statuses fail immediately
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **PagerDuty Headers**: Versioned media type, token auth and `From` actor

mod client;
mod rate_limit;
mod retry;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, DEFAULT_BASE_URL, PAGERDUTY_MEDIA_TYPE,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
pub use retry::{RetryPolicy, DEFAULT_MAX_ELAPSED};
