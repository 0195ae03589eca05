//! Configuration for the HTTP client.

use crate::error::{ClientError, ClientResult};
use std::time::Duration;

/// Largest page size the platform accepts.
pub const MAX_PAGE_SIZE: u32 = 250;

/// Configuration for a [`ShopClient`](crate::ShopClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL, e.g. `https://shop.example.com`. Trailing slashes are ignored.
    pub base_url: String,
    /// Public API key.
    pub public_key: String,
    /// Secret API key used for request signing.
    pub secret_key: String,
    /// Per-request timeout.
    pub timeout: Duration,
    /// Whether to verify TLS certificates.
    pub verify_tls: bool,
    /// Backoff for connection-level failures.
    pub retry: RetryConfig,
    /// Fixed wait for rate-limited responses.
    pub rate_limit: RateLimitConfig,
    /// Upper bound for page sizes.
    pub max_page_size: u32,
}

impl ClientConfig {
    /// Creates a configuration with default tunables.
    pub fn new(
        base_url: impl Into<String>,
        public_key: impl Into<String>,
        secret_key: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            public_key: public_key.into(),
            secret_key: secret_key.into(),
            timeout: Duration::from_secs(30),
            verify_tls: true,
            retry: RetryConfig::default(),
            rate_limit: RateLimitConfig::default(),
            max_page_size: MAX_PAGE_SIZE,
        }
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enables or disables TLS verification.
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Sets the connection retry configuration.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Sets the rate-limit configuration.
    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Checks that keys and base URL are usable.
    pub fn validate(&self) -> ClientResult<()> {
        if self.public_key.is_empty() || self.secret_key.is_empty() {
            return Err(ClientError::InvalidConfig(
                "public and secret key are required".into(),
            ));
        }
        if self.base_url.is_empty() {
            return Err(ClientError::InvalidConfig("base url is required".into()));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ClientError::InvalidConfig(format!(
                "base url must be http(s): {}",
                self.base_url
            )));
        }
        if self.max_page_size == 0 {
            return Err(ClientError::InvalidConfig(
                "max page size must be positive".into(),
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 0.0 {
            return Err(ClientError::InvalidConfig(format!(
                "backoff multiplier must be a non-negative number: {multiplier}"
            )));
        }
        Ok(())
    }

    /// Clamps a requested page size to `1..=max_page_size`.
    pub fn clamp_page_size(&self, per_page: u32) -> u32 {
        per_page.clamp(1, self.max_page_size.max(1))
    }
}

/// Exponential backoff for connection-level failures.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Retries after the first failed attempt.
    pub max_attempts: u32,
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound for a single delay.
    pub max_delay: Duration,
    /// Multiplier applied per retry.
    pub backoff_multiplier: f64,
}

impl RetryConfig {
    /// Creates a configuration with `max_attempts` retries.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(300),
            backoff_multiplier: 2.0,
        }
    }

    /// Creates a configuration with no retries.
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 0,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_multiplier: 1.0,
        }
    }

    /// Sets the initial delay.
    pub fn with_initial_delay(mut self, delay: Duration) -> Self {
        self.initial_delay = delay;
        self
    }

    /// Sets the maximum delay.
    pub fn with_max_delay(mut self, delay: Duration) -> Self {
        self.max_delay = delay;
        self
    }

    /// Sets the backoff multiplier.
    pub fn with_backoff_multiplier(mut self, multiplier: f64) -> Self {
        self.backoff_multiplier = multiplier;
        self
    }

    /// Delay before retry number `retry` (1-indexed). Zero for `0`.
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let max = self.max_delay.as_secs_f64();
        let secs = self.initial_delay.as_secs_f64()
            * self.backoff_multiplier.powi(retry.saturating_sub(1) as i32);
        if secs.is_nan() {
            return self.max_delay;
        }
        Duration::from_secs_f64(secs.clamp(0.0, max))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self::new(3)
    }
}

/// Fixed-wait retry for HTTP 429.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Retries after the first rate-limited attempt.
    pub max_attempts: u32,
    /// Wait before each retry.
    pub wait: Duration,
}

impl RateLimitConfig {
    /// Creates a configuration.
    pub fn new(max_attempts: u32, wait: Duration) -> Self {
        Self { max_attempts, wait }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(60))
    }
}
