//! Bounded retry policy
//!
//! Polling waits and deletion backoff are configured through one policy
//! value passed into each waiting operation, instead of hand-rolled loops
//! at every call site.

use std::time::Duration;

/// Retry configuration with capped exponential backoff
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts before giving up
    pub max_attempts: u32,

    /// Delay after the first attempt
    pub initial_delay: Duration,

    /// Ceiling for the backed-off delay
    pub max_delay: Duration,

    /// Backoff multiplier applied per attempt
    pub multiplier: f64,
}

impl RetryPolicy {
    /// Policy for eventual-consistency polling: frequent, flat interval.
    pub fn polling() -> Self {
        Self {
            max_attempts: 30,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(1),
            multiplier: 1.0,
        }
    }

    /// Policy for post-create visibility probes: a small fixed attempt
    /// count before "not found yet" becomes a real failure.
    pub fn visibility() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(2),
            multiplier: 1.5,
        }
    }

    /// Policy for deletion-time dependency violations: patient, backed off.
    pub fn deletion() -> Self {
        Self {
            max_attempts: 8,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }

    /// Delay to sleep after the given zero-based attempt.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let backed_off =
            self.initial_delay.as_millis() as f64 * self.multiplier.powi(attempt as i32);
        let capped = backed_off.min(self.max_delay.as_millis() as f64);
        Duration::from_millis(capped as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            multiplier: 2.0,
        }
    }
}
