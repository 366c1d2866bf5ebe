//! Shared token-bucket rate limiter
//!
//! One limiter paces every outbound remote request of a batch, no matter how
//! many configs run concurrently. All state sits behind a single mutex that is
//! never held across an `.await`; waiting happens outside the lock.
//!
//! # Usage
//!
//! ```ignore
//! let limiter = Arc::new(SharedRateLimiter::new(10, 3));
//!
//! limiter.acquire().await;
//! // issue the request...
//!
//! // On a 429 response every caller pauses until the deadline
//! limiter.report_rate_limited(Duration::from_secs(30));
//! ```

use crate::config::RateLimitConfig;
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::Instant;

/// Window used for the observed requests-per-minute estimate.
const OBSERVATION_WINDOW: Duration = Duration::from_secs(60);

/// Tolerance for floating point refill arithmetic.
const TOKEN_EPSILON: f64 = 1e-9;

/// Point-in-time view of the limiter
#[derive(Debug, Clone, PartialEq)]
pub struct RateLimiterStatus {
    /// Requests granted during the last minute
    pub requests_per_minute: f64,
    /// Callers currently waiting in `acquire()`
    pub pending_requests: usize,
    /// Whether a rate-limit pause is in effect
    pub is_paused: bool,
    /// When the current pause ends
    pub retry_after: Option<Instant>,
    /// Tokens available right now
    pub available_tokens: f64,
}

#[derive(Debug)]
struct BucketState {
    tokens: f64,
    last_refill: Instant,
    paused_until: Option<Instant>,
    pending: usize,
    granted: VecDeque<Instant>,
}

/// Token bucket shared by all workers of a batch
#[derive(Debug)]
pub struct SharedRateLimiter {
    requests_per_minute: u32,
    burst_capacity: u32,
    state: Mutex<BucketState>,
}

impl SharedRateLimiter {
    /// Creates a limiter refilling `requests_per_minute` tokens per minute up
    /// to `burst_capacity`. Zero values are raised to 1.
    pub fn new(requests_per_minute: u32, burst_capacity: u32) -> Self {
        let requests_per_minute = requests_per_minute.max(1);
        let burst_capacity = burst_capacity.max(1);

        Self {
            requests_per_minute,
            burst_capacity,
            state: Mutex::new(BucketState {
                tokens: f64::from(burst_capacity),
                last_refill: Instant::now(),
                paused_until: None,
                pending: 0,
                granted: VecDeque::new(),
            }),
        }
    }

    /// Creates a limiter from settings
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(config.requests_per_minute, config.burst_capacity)
    }

    /// Configured sustained rate
    pub fn requests_per_minute(&self) -> u32 {
        self.requests_per_minute
    }

    /// Configured burst size
    pub fn burst_capacity(&self) -> u32 {
        self.burst_capacity
    }

    /// Waits until a request slot is available and takes it.
    ///
    /// A pause set by [`report_rate_limited`](Self::report_rate_limited)
    /// takes priority over available tokens. Requests are never dropped;
    /// dropping the returned future abandons the wait.
    pub async fn acquire(&self) {
        let _pending = PendingGuard::register(self);

        loop {
            let wait = {
                let mut state = self.lock();
                match self.try_take(&mut state, Instant::now()) {
                    Ok(()) => return,
                    Err(wait) => wait,
                }
            };
            tokio::time::sleep(wait).await;
        }
    }

    /// Pauses every caller until `retry_after` has elapsed.
    ///
    /// Overlapping reports keep the later deadline. The bucket is drained so
    /// traffic restarts at the sustained rate instead of with a burst.
    pub fn report_rate_limited(&self, retry_after: Duration) {
        let now = Instant::now();
        let deadline = now + retry_after;
        let mut state = self.lock();

        let deadline = match state.paused_until {
            Some(existing) if existing > deadline => existing,
            _ => deadline,
        };
        state.paused_until = Some(deadline);
        state.tokens = 0.0;
        state.last_refill = now;

        tracing::warn!(
            retry_after_ms = retry_after.as_millis() as u64,
            "Remote API rate limit hit, pausing requests"
        );
    }

    /// Snapshot of the limiter state
    pub fn status(&self) -> RateLimiterStatus {
        let now = Instant::now();
        let mut state = self.lock();

        let paused_until = state.paused_until.filter(|until| *until > now);
        if paused_until.is_none() {
            self.refill(&mut state, now);
        }
        Self::prune(&mut state, now);

        RateLimiterStatus {
            requests_per_minute: state.granted.len() as f64 * 60.0
                / OBSERVATION_WINDOW.as_secs_f64(),
            pending_requests: state.pending,
            is_paused: paused_until.is_some(),
            retry_after: paused_until,
            available_tokens: if paused_until.is_some() { 0.0 } else { state.tokens },
        }
    }

    fn lock(&self) -> MutexGuard<'_, BucketState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn refill_per_second(&self) -> f64 {
        f64::from(self.requests_per_minute) / 60.0
    }

    fn refill(&self, state: &mut BucketState, now: Instant) {
        let elapsed = now.saturating_duration_since(state.last_refill);
        let refilled = state.tokens + elapsed.as_secs_f64() * self.refill_per_second();
        state.tokens = refilled.min(f64::from(self.burst_capacity));
        state.last_refill = now;
    }

    fn prune(state: &mut BucketState, now: Instant) {
        while let Some(front) = state.granted.front() {
            if now.saturating_duration_since(*front) >= OBSERVATION_WINDOW {
                state.granted.pop_front();
            } else {
                break;
            }
        }
    }

    /// Takes a token or returns how long to wait before trying again.
    fn try_take(&self, state: &mut BucketState, now: Instant) -> Result<(), Duration> {
        if let Some(until) = state.paused_until {
            if now < until {
                return Err(until - now);
            }
            state.paused_until = None;
            state.last_refill = until;
        }

        self.refill(state, now);

        if state.tokens + TOKEN_EPSILON >= 1.0 {
            state.tokens = (state.tokens - 1.0).max(0.0);
            state.granted.push_back(now);
            Self::prune(state, now);
            return Ok(());
        }

        let missing = 1.0 - state.tokens;
        let wait = Duration::from_secs_f64(missing / self.refill_per_second());
        Err(wait.max(Duration::from_millis(1)))
    }
}

/// Counts a caller as pending for as long as it waits in `acquire()`.
struct PendingGuard<'a> {
    limiter: &'a SharedRateLimiter,
}

impl<'a> PendingGuard<'a> {
    fn register(limiter: &'a SharedRateLimiter) -> Self {
        limiter.lock().pending += 1;
        Self { limiter }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        let mut state = self.limiter.lock();
        state.pending = state.pending.saturating_sub(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn test_burst_then_sustained_rate() {
        // 60 rpm = one token per second, two tokens of burst
        let limiter = SharedRateLimiter::new(60, 2);
        let start = Instant::now();

        for _ in 0..5 {
            limiter.acquire().await;
        }

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(3), "elapsed {elapsed:?}");
        assert!(elapsed < Duration::from_millis(3100), "elapsed {elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_callers_never_exceed_rate() {
        let limiter = Arc::new(SharedRateLimiter::new(600, 1));
        let start = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..20 {
            let limiter = limiter.clone();
            handles.push(tokio::spawn(async move {
                limiter.acquire().await;
                Instant::now()
            }));
        }

        let mut granted = Vec::new();
        for handle in handles {
            granted.push(handle.await.unwrap());
        }
        granted.sort();

        // 10 per second with no burst: 20 grants need at least 1.9s
        let span = granted[granted.len() - 1] - start;
        assert!(span >= Duration::from_millis(1900), "span {span:?}");
        for pair in granted.windows(2) {
            assert!(pair[1] - pair[0] >= Duration::from_millis(99));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_takes_priority_over_tokens() {
        let limiter = SharedRateLimiter::new(600, 5);
        limiter.report_rate_limited(Duration::from_secs(5));

        let status = limiter.status();
        assert!(status.is_paused);
        assert!(status.retry_after.is_some());

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert!(!limiter.status().is_paused);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overlapping_pauses_keep_later_deadline() {
        let limiter = SharedRateLimiter::new(600, 1);
        limiter.report_rate_limited(Duration::from_secs(10));
        limiter.report_rate_limited(Duration::from_secs(2));

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_reports_pending_callers() {
        let limiter = Arc::new(SharedRateLimiter::new(1, 1));
        limiter.acquire().await;

        let waiter = {
            let limiter = limiter.clone();
            tokio::spawn(async move { limiter.acquire().await })
        };
        tokio::task::yield_now().await;
        tokio::task::yield_now().await;

        let status = limiter.status();
        assert_eq!(status.pending_requests, 1);
        assert!(!status.is_paused);
        assert!((status.requests_per_minute - 1.0).abs() < f64::EPSILON);

        waiter.await.unwrap();
        assert_eq!(limiter.status().pending_requests, 0);
    }

    #[test]
    fn test_zero_settings_are_clamped() {
        let limiter = SharedRateLimiter::new(0, 0);
        assert_eq!(limiter.requests_per_minute(), 1);
        assert_eq!(limiter.burst_capacity(), 1);
    }
}
