//! Retry policy for transient HTTP failures
//!
//! Decides which failures are worth another attempt and how long to wait
//! before it. Delays follow the Fibonacci sequence and the total time spent
//! retrying one request is bounded by `max_elapsed`.

use crate::error::Error;
use std::time::Duration;

/// Default ceiling on the time spent retrying a single request
pub const DEFAULT_MAX_ELAPSED: Duration = Duration::from_secs(120);

/// Retry/backoff policy applied by the HTTP client
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Length of one schedule step (1, 1, 2, 3, ... are multiples of this)
    pub unit: Duration,
    /// Budget for the whole retry sequence of one request
    pub max_elapsed: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            unit: Duration::from_secs(1),
            max_elapsed: DEFAULT_MAX_ELAPSED,
        }
    }
}

impl RetryPolicy {
    /// Create the default Fibonacci policy (1s unit, 120s budget)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the schedule step length
    #[must_use]
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    /// Set the total retry budget
    #[must_use]
    pub fn with_max_elapsed(mut self, max_elapsed: Duration) -> Self {
        self.max_elapsed = max_elapsed;
        self
    }

    /// Whether a failed attempt may be retried
    pub fn should_retry(&self, error: &Error) -> bool {
        error.is_retryable()
    }

    /// Delay before retry number `attempt` (1-based)
    pub fn next_delay(&self, attempt: u32) -> Duration {
        let steps = fibonacci(attempt.max(1));
        self.unit
            .checked_mul(u32::try_from(steps).unwrap_or(u32::MAX))
            .unwrap_or(Duration::MAX)
    }

    /// Total retry budget
    pub fn max_elapsed(&self) -> Duration {
        self.max_elapsed
    }

    /// Wait before retry number `attempt`, given time already spent
    ///
    /// `hint` replaces the scheduled delay (e.g. a `Retry-After` header).
    /// Returns `None` once the budget is used up; otherwise the wait is
    /// truncated so the budget is never exceeded.
    pub fn delay_within_budget(
        &self,
        attempt: u32,
        elapsed: Duration,
        hint: Option<Duration>,
    ) -> Option<Duration> {
        if elapsed >= self.max_elapsed {
            return None;
        }
        let remaining = self.max_elapsed - elapsed;
        let delay = hint.unwrap_or_else(|| self.next_delay(attempt));
        Some(delay.min(remaining))
    }
}

/// n-th Fibonacci number with fib(1) = fib(2) = 1
fn fibonacci(n: u32) -> u64 {
    let (mut a, mut b) = (1u64, 1u64);
    for _ in 1..n {
        let next = a.saturating_add(b);
        a = b;
        b = next;
    }
    a
}
