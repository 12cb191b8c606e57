//! Request-count limiting over a fixed time window.
//!
//! Each [`FetchClient`](crate::fetch::FetchClient) and the
//! [`LlmGateway`](crate::gateway::LlmGateway) owns its own [`RateLimiter`];
//! limiters are never shared between sources.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use canopy_core::rate_limit::{RateLimitConfig, RateLimiter};
//!
//! # async fn run() -> Result<(), canopy_core::AppError> {
//! // 5 requests per minute, waiting out the window at most 3 times.
//! let limiter = RateLimiter::new(
//!     "jsearch",
//!     RateLimitConfig::new(5, Duration::from_secs(60)).with_max_retries(3),
//! );
//! limiter.acquire().await?;
//! # Ok(())
//! # }
//! ```

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use tokio::time::Instant;

use crate::error::AppError;

/// Configuration for a [`RateLimiter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RateLimitConfig {
    /// Requests allowed per window.
    pub max_requests: u32,

    /// Length of the counting window.
    pub window: Duration,

    /// How many times a caller may wait (window reset or upstream 429)
    /// before [`AppError::RateLimitExceeded`] is returned.
    pub max_retries: u32,

    /// Extra time slept past the end of the window before retrying.
    pub reset_pad: Duration,

    /// Base of the incremental delay applied after an upstream 429
    /// (`retry_step × retry_count`).
    pub retry_step: Duration,
}

impl RateLimitConfig {
    /// Create a config with the given budget, 3 retries and 1 s pads.
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            max_retries: 3,
            reset_pad: Duration::from_secs(1),
            retry_step: Duration::from_secs(1),
        }
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_reset_pad(mut self, pad: Duration) -> Self {
        self.reset_pad = pad;
        self
    }

    pub fn with_retry_step(mut self, step: Duration) -> Self {
        self.retry_step = step;
        self
    }

    /// Budget for completion calls: 3 per minute, never waits.
    pub fn for_completions() -> Self {
        Self::new(3, Duration::from_secs(60)).with_max_retries(0)
    }
}

impl Default for RateLimitConfig {
    /// 5 requests per 60 s window with up to 3 waits.
    fn default() -> Self {
        Self::new(5, Duration::from_secs(60))
    }
}

/// Counters of a [`RateLimiter`] at one point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimiterState {
    pub window_start: Instant,
    pub request_count: u32,
    pub retry_count: u32,
}

impl RateLimiterState {
    fn new() -> Self {
        Self {
            window_start: Instant::now(),
            request_count: 0,
            retry_count: 0,
        }
    }

    /// Start a fresh window if the current one has elapsed.
    fn roll_window(&mut self, now: Instant, window: Duration) {
        if now.duration_since(self.window_start) >= window {
            self.window_start = now;
            self.request_count = 0;
            self.retry_count = 0;
        }
    }
}

/// Counts requests per window and makes callers wait (or fail) once the
/// budget is spent.
pub struct RateLimiter {
    name: String,
    config: RateLimitConfig,
    state: Mutex<RateLimiterState>,
}

impl RateLimiter {
    pub fn new(name: impl Into<String>, config: RateLimitConfig) -> Self {
        Self {
            name: name.into(),
            config,
            state: Mutex::new(RateLimiterState::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }

    /// Acquires the state lock, recovering from poison if necessary.
    fn lock_state(&self) -> MutexGuard<'_, RateLimiterState> {
        self.state.lock().unwrap_or_else(|poisoned| {
            tracing::warn!(limiter = %self.name, "Recovered from poisoned mutex");
            poisoned.into_inner()
        })
    }

    /// Snapshot of the current counters.
    pub fn state(&self) -> RateLimiterState {
        let mut state = self.lock_state();
        state.roll_window(Instant::now(), self.config.window);
        *state
    }

    /// Take one request slot, sleeping until the window resets when the
    /// budget is spent.
    ///
    /// Each wait consumes one retry; once `max_retries` waits have happened
    /// inside the same window the call fails with
    /// [`AppError::RateLimitExceeded`].
    pub async fn acquire(&self) -> Result<(), AppError> {
        loop {
            let wait = {
                let mut state = self.lock_state();
                let now = Instant::now();
                state.roll_window(now, self.config.window);

                if state.request_count < self.config.max_requests {
                    state.request_count += 1;
                    return Ok(());
                }

                if state.retry_count >= self.config.max_retries {
                    tracing::warn!(
                        limiter = %self.name,
                        retries = state.retry_count,
                        "Rate limit exceeded after retries"
                    );
                    return Err(AppError::RateLimitExceeded);
                }

                state.retry_count += 1;
                let elapsed = now.duration_since(state.window_start);
                self.config.window.saturating_sub(elapsed) + self.config.reset_pad
            };

            tracing::info!(
                limiter = %self.name,
                wait_ms = %wait.as_millis(),
                "Waiting for rate limit reset"
            );
            tokio::time::sleep(wait).await;
        }
    }

    /// Take one request slot without waiting.
    pub fn try_acquire(&self) -> Result<(), AppError> {
        let mut state = self.lock_state();
        state.roll_window(Instant::now(), self.config.window);
        if state.request_count < self.config.max_requests {
            state.request_count += 1;
            Ok(())
        } else {
            Err(AppError::RateLimitExceeded)
        }
    }

    /// Charge one retry for an upstream rate-limit response and return how
    /// long to back off before re-issuing the request.
    pub fn register_retry(&self) -> Result<Duration, AppError> {
        let mut state = self.lock_state();
        if state.retry_count >= self.config.max_retries {
            return Err(AppError::RateLimitExceeded);
        }
        state.retry_count += 1;
        Ok(self.config.retry_step * state.retry_count)
    }

    /// Reset the retry budget after a successful request.
    pub fn record_success(&self) {
        self.lock_state().retry_count = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limiter(max_requests: u32, window_ms: u64, max_retries: u32) -> RateLimiter {
        RateLimiter::new(
            "test",
            RateLimitConfig::new(max_requests, Duration::from_millis(window_ms))
                .with_max_retries(max_retries)
                .with_reset_pad(Duration::ZERO)
                .with_retry_step(Duration::from_millis(10)),
        )
    }

    #[tokio::test]
    async fn allows_requests_within_budget() {
        let limiter = limiter(3, 60_000, 0);
        for _ in 0..3 {
            limiter.acquire().await.unwrap();
        }
        assert_eq!(limiter.state().request_count, 3);
    }

    #[tokio::test]
    async fn fails_when_budget_spent_and_no_retries_left() {
        let limiter = limiter(2, 60_000, 0);
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        let err = limiter.acquire().await.unwrap_err();
        assert!(matches!(err, AppError::RateLimitExceeded));
    }

    #[tokio::test]
    async fn waits_for_window_reset_when_retries_remain() {
        let limiter = limiter(2, 80, 1);
        limiter.acquire().await.unwrap();
        limiter.acquire().await.unwrap();

        let start = Instant::now();
        limiter.acquire().await.unwrap();
        let elapsed = start.elapsed();

        assert!(
            elapsed >= Duration::from_millis(60),
            "third request should wait for the window, elapsed: {elapsed:?}"
        );
        let state = limiter.state();
        assert_eq!(state.request_count, 1);
        assert_eq!(state.retry_count, 0);
    }

    #[tokio::test]
    async fn elapsed_window_resets_count() {
        let limiter = limiter(1, 40, 0);
        limiter.try_acquire().unwrap();
        assert!(limiter.try_acquire().is_err());

        tokio::time::sleep(Duration::from_millis(60)).await;

        assert_eq!(limiter.state().request_count, 0);
        limiter.try_acquire().unwrap();
        assert_eq!(limiter.state().request_count, 1);
    }

    #[test]
    fn register_retry_backs_off_incrementally() {
        let limiter = limiter(5, 60_000, 3);
        assert_eq!(limiter.register_retry().unwrap(), Duration::from_millis(10));
        assert_eq!(limiter.register_retry().unwrap(), Duration::from_millis(20));
        assert_eq!(limiter.register_retry().unwrap(), Duration::from_millis(30));
        assert!(matches!(
            limiter.register_retry().unwrap_err(),
            AppError::RateLimitExceeded
        ));

        limiter.record_success();
        assert_eq!(limiter.state().retry_count, 0);
    }

    #[test]
    fn completion_budget_defaults() {
        let config = RateLimitConfig::for_completions();
        assert_eq!(config.max_requests, 3);
        assert_eq!(config.window, Duration::from_secs(60));
        assert_eq!(config.max_retries, 0);
    }

    #[test]
    fn default_config_is_sensible() {
        let config = RateLimitConfig::default();
        assert_eq!(config.max_requests, 5);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.reset_pad, Duration::from_secs(1));
    }
}
