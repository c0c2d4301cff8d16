//! Backoff for idempotent backend calls
//!
//! Only transient failures are retried: dropped connections, timeouts and
//! the gateway/throttling statuses a backend returns while restarting.

use super::super::error::{ApiError, ApiResult};
use log::{debug, info, warn};
use rand::Rng;
use std::future::Future;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub backoff_cap: Duration,
    /// Spread waits over 50..100% of the computed backoff
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(300),
            backoff_cap: Duration::from_secs(5),
            jitter: true,
        }
    }
}

impl RetryConfig {
    /// Default backoff with a different attempt budget (minimum one attempt)
    pub fn with_max_attempts(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            ..Self::default()
        }
    }

    /// Single attempt, no waiting
    pub fn disabled() -> Self {
        Self {
            max_attempts: 1,
            initial_backoff: Duration::ZERO,
            backoff_cap: Duration::ZERO,
            jitter: false,
        }
    }
}

/// Statuses worth another attempt: timeout, throttling, gateway trouble
pub fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 429 | 502 | 503 | 504)
}

/// Whether repeating the same request could succeed
pub fn is_transient(error: &ApiError) -> bool {
    match error {
        ApiError::Transport(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| is_transient_status(s.as_u16()))
        }
        ApiError::RequestFailed { status, .. } => is_transient_status(*status),
        _ => false,
    }
}

#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Run `operation` until it succeeds, fails for good, or the attempt
    /// budget is spent. The last error is returned as is.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> ApiResult<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => {
                    if attempt > 1 {
                        info!("Request went through on attempt {}", attempt);
                    }
                    return Ok(value);
                }
                Err(error) if attempt < max_attempts && is_transient(&error) => {
                    let wait = self.backoff(attempt);
                    warn!("Attempt {}/{} failed, retrying in {:?}: {}", attempt, max_attempts, wait, error);
                    tokio::time::sleep(wait).await;
                    attempt += 1;
                }
                Err(error) => {
                    debug!("Giving up after attempt {}: {}", attempt, error);
                    return Err(error);
                }
            }
        }
    }

    /// Wait before attempt `attempt + 1`: doubling from the initial backoff,
    /// capped
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        let wait = self
            .config
            .initial_backoff
            .saturating_mul(factor)
            .min(self.config.backoff_cap);

        if self.config.jitter && !wait.is_zero() {
            wait.mul_f64(rand::thread_rng().gen_range(0.5..=1.0))
        } else {
            wait
        }
    }
}
