//! Retry policy for remote requests
//!
//! Retryable failures (timeouts, 5xx, rate limiting, dropped connections) are
//! retried with capped exponential backoff. Everything else is returned on the
//! first failure.

use crate::config::RetryConfig;
use crate::domain::errors::RemoteError;
use std::future::Future;
use std::time::Duration;

/// Pause applied when a 429 response carries no Retry-After hint.
pub const DEFAULT_RATE_LIMIT_PAUSE: Duration = Duration::from_secs(60);

/// A retry that is about to happen
#[derive(Debug, Clone, PartialEq)]
pub struct RetryAttempt {
    /// The attempt that just failed (1-based)
    pub attempt: usize,
    /// Total attempts allowed
    pub max_attempts: usize,
    /// Why the attempt failed
    pub error: RemoteError,
    /// Wait before the next attempt
    pub delay: Duration,
}

/// Outcome of a failed attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    Retry(Duration),
    GiveUp,
}

/// Capped exponential backoff policy
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_retries: usize,
    initial_delay: Duration,
    max_delay: Duration,
    backoff_multiplier: f64,
}

impl RetryPolicy {
    /// `max_retries` is the total number of attempts, including the first one.
    pub fn new(
        max_retries: usize,
        initial_delay: Duration,
        max_delay: Duration,
        backoff_multiplier: f64,
    ) -> Self {
        Self {
            max_retries: max_retries.max(1),
            initial_delay,
            max_delay: max_delay.max(initial_delay),
            backoff_multiplier: backoff_multiplier.max(1.0),
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_retries,
            Duration::from_millis(config.initial_delay_ms),
            Duration::from_millis(config.max_delay_ms),
            config.backoff_multiplier,
        )
    }

    pub fn max_retries(&self) -> usize {
        self.max_retries
    }

    /// Delay after the given failed attempt (1-based).
    ///
    /// Non-decreasing in `attempt` and never above the configured maximum.
    pub fn delay_for_attempt(&self, attempt: usize) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as usize) as i32;
        let factor = self.backoff_multiplier.powi(exponent);
        let millis = self.initial_delay.as_millis() as f64 * factor;
        let capped = millis.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }

    /// Decides what to do after `attempt` failed with `error`
    ///
    /// A rate-limited failure waits at least as long as the remote asked
    /// (or [`DEFAULT_RATE_LIMIT_PAUSE`] without a hint).
    pub fn decide(&self, error: &RemoteError, attempt: usize) -> RetryDecision {
        if !error.is_retryable() || attempt >= self.max_retries {
            return RetryDecision::GiveUp;
        }

        let backoff = self.delay_for_attempt(attempt);
        let delay = match error {
            RemoteError::RateLimited { retry_after } => {
                retry_after.unwrap_or(DEFAULT_RATE_LIMIT_PAUSE).max(backoff)
            }
            _ => backoff,
        };
        RetryDecision::Retry(delay)
    }

    /// Runs `operation` until it succeeds, fails fatally, or runs out of
    /// attempts. `on_retry` is called before every backoff sleep.
    pub async fn execute<T, F, Fut, R>(
        &self,
        mut operation: F,
        mut on_retry: R,
    ) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, RemoteError>>,
        R: FnMut(&RetryAttempt),
    {
        let mut attempt = 1;

        loop {
            match operation().await {
                Ok(value) => return Ok(value),
                Err(error) => match self.decide(&error, attempt) {
                    RetryDecision::GiveUp => {
                        if error.is_retryable() {
                            tracing::warn!(
                                attempts = attempt,
                                error = %error,
                                "Remote request failed after all retries"
                            );
                        }
                        return Err(error);
                    }
                    RetryDecision::Retry(delay) => {
                        on_retry(&RetryAttempt {
                            attempt,
                            max_attempts: self.max_retries,
                            error,
                            delay,
                        });
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                    }
                },
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use test_case::test_case;

    fn policy(max_retries: usize) -> RetryPolicy {
        RetryPolicy::new(
            max_retries,
            Duration::from_millis(100),
            Duration::from_millis(1000),
            2.0,
        )
    }

    #[test_case(1, 100 ; "first retry uses initial delay")]
    #[test_case(2, 200 ; "second retry doubles")]
    #[test_case(4, 800 ; "fourth retry")]
    #[test_case(5, 1000 ; "capped at max delay")]
    #[test_case(30, 1000 ; "large attempt stays capped")]
    fn test_delay_for_attempt(attempt: usize, expected_ms: u64) {
        assert_eq!(
            policy(5).delay_for_attempt(attempt),
            Duration::from_millis(expected_ms)
        );
    }

    #[test]
    fn test_delays_are_monotonic() {
        let policy = policy(10);
        let delays: Vec<_> = (1..10).map(|a| policy.delay_for_attempt(a)).collect();
        assert!(delays.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_fatal_errors_give_up_immediately() {
        let error = RemoteError::AuthenticationFailed("bad token".to_string());
        assert_eq!(policy(5).decide(&error, 1), RetryDecision::GiveUp);
    }

    #[test_case(Some(30_000), 30_000 ; "retry after above backoff wins")]
    #[test_case(Some(50), 200 ; "backoff above retry after wins")]
    #[test_case(None, 60_000 ; "missing hint uses default pause")]
    fn test_rate_limited_delay(retry_after_ms: Option<u64>, expected_ms: u64) {
        let error = RemoteError::RateLimited {
            retry_after: retry_after_ms.map(Duration::from_millis),
        };
        assert_eq!(
            policy(5).decide(&error, 2),
            RetryDecision::Retry(Duration::from_millis(expected_ms))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_reports_rate_limit_wait() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let mut delays = Vec::new();

        let start = tokio::time::Instant::now();
        let result = policy(3)
            .execute(
                move || async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Err(RemoteError::RateLimited {
                            retry_after: Some(Duration::from_secs(30)),
                        })
                    } else {
                        Ok(())
                    }
                },
                |attempt| delays.push(attempt.delay),
            )
            .await;

        assert!(result.is_ok());
        assert_eq!(delays, vec![Duration::from_secs(30)]);
        assert!(start.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_retries_until_success() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let mut retries = Vec::new();

        let result = policy(4)
            .execute(
                move || async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    if n < 2 {
                        Err(RemoteError::Timeout(Duration::from_secs(30)))
                    } else {
                        Ok(n)
                    }
                },
                |attempt| retries.push(attempt.attempt),
            )
            .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(retries, vec![1, 2]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_stops_at_max_attempts() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;
        let mut retries = 0;

        let result: Result<(), _> = policy(3)
            .execute(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::ServerError {
                        status: 503,
                        message: "unavailable".to_string(),
                    })
                },
                |_| retries += 1,
            )
            .await;

        assert!(matches!(result, Err(RemoteError::ServerError { status: 503, .. })));
        assert_eq!(counter.load(Ordering::SeqCst), 3);
        assert_eq!(retries, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_execute_does_not_retry_client_errors() {
        let counter = AtomicUsize::new(0);
        let calls = &counter;

        let result: Result<(), _> = policy(5)
            .execute(
                move || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(RemoteError::ClientError {
                        status: 404,
                        message: "not found".to_string(),
                    })
                },
                |_| panic!("client errors must not be retried"),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }
}
