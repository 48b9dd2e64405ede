//! Retry policy applied to idempotent directory and registry reads.

use std::time::Duration;

/// Retry configuration with exponential backoff.
///
/// Only read requests are retried. Submissions go out exactly once so a
/// flaky network can never register the same collection point twice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryConfig {
    /// Number of retry attempts after the first try.
    pub retries: usize,
    /// Initial backoff duration between retries.
    pub initial_backoff: Duration,
    /// Maximum backoff duration, doubling stops here.
    pub max_backoff: Duration,
}

impl RetryConfig {
    pub fn new(retries: usize, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        Self {
            retries,
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms),
        }
    }

    /// Policy that never retries, useful when a caller wants to see the
    /// first failure immediately.
    pub fn none() -> Self {
        Self::new(0, 0, 0)
    }

    /// The backoff to sleep before retry `attempt` (zero-based), doubling
    /// from `initial_backoff` and capped at `max_backoff`.
    pub fn backoff_for(&self, attempt: usize) -> Duration {
        let doubled = self
            .initial_backoff
            .saturating_mul(1u32.checked_shl(attempt as u32).unwrap_or(u32::MAX));
        doubled.min(self.max_backoff)
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            initial_backoff: Duration::from_millis(250),
            max_backoff: Duration::from_millis(5000),
        }
    }
}
