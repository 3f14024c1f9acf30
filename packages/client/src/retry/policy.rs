//! Retry policy configuration
//!
//! Bounded retry for mutations: a maximum attempt count and a delay that is
//! either fixed or computed from the attempt number. Deliberately
//! deterministic; callers observe retries only as elapsed time.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Delay between a failed attempt and the next one.
#[derive(Clone)]
pub enum RetryDelay {
    /// Constant wait between attempts
    Fixed(Duration),
    /// Wait computed from the attempt number (1-based)
    Backoff(Arc<dyn Fn(u32) -> Duration + Send + Sync>),
}

impl fmt::Debug for RetryDelay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetryDelay::Fixed(delay) => f.debug_tuple("Fixed").field(delay).finish(),
            RetryDelay::Backoff(_) => f.write_str("Backoff(..)"),
        }
    }
}

/// Retry configuration for a mutation.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Number of retries after the initial attempt; 0 means fail fast
    pub retries: u32,
    /// Delay strategy between attempts
    pub delay: RetryDelay,
}

impl Default for RetryPolicy {
    /// No retries, with the conventional 1 second delay should the count be
    /// raised without picking a strategy.
    fn default() -> Self {
        Self {
            retries: 0,
            delay: RetryDelay::Fixed(Duration::from_millis(1000)),
        }
    }
}

impl RetryPolicy {
    /// Single attempt, no retries.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// Retry up to `retries` times with a constant delay.
    #[must_use]
    pub fn fixed(retries: u32, delay: Duration) -> Self {
        Self {
            retries,
            delay: RetryDelay::Fixed(delay),
        }
    }

    /// Retry up to `retries` times with a delay computed from the attempt
    /// number (1 for the first retry).
    #[must_use]
    pub fn backoff(retries: u32, delay: impl Fn(u32) -> Duration + Send + Sync + 'static) -> Self {
        Self {
            retries,
            delay: RetryDelay::Backoff(Arc::new(delay)),
        }
    }

    /// Delay to wait before the given retry attempt.
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match &self.delay {
            RetryDelay::Fixed(delay) => *delay,
            RetryDelay::Backoff(compute) => compute(attempt),
        }
    }
}
