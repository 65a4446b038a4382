//! Retry policy for the atomic rename.

use std::time::Duration;

/// Bounded, linearly backed-off retry policy.
///
/// Attempt `n` (1-based) that fails is followed by a sleep of
/// `backoff_step * n` before attempt `n + 1`. No sleep follows the last
/// attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum number of attempts (at least one is always made).
    pub max_attempts: u32,
    /// Linear backoff unit.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_step: Duration::from_millis(150),
        }
    }
}

impl RetryPolicy {
    /// Creates a policy with `max_attempts` and the default 150 ms step.
    #[must_use]
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            ..Self::default()
        }
    }

    /// A single attempt, no retries.
    #[must_use]
    pub fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            backoff_step: Duration::ZERO,
        }
    }

    /// Sets the backoff step.
    #[must_use]
    pub const fn with_backoff_step(mut self, step: Duration) -> Self {
        self.backoff_step = step;
        self
    }

    /// Number of attempts actually made (never zero).
    #[must_use]
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Delay to sleep after failed attempt `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff_step.saturating_mul(attempt)
    }
}
