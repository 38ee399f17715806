//! Exponential backoff between retry attempts.

use std::time::Duration;

/// Backoff schedule: `initial_delay * 2^(attempt-1)`, capped at `max_delay`.
#[derive(Debug, Clone, Copy)]
pub struct Backoff {
    /// Delay before the first retry.
    pub initial_delay: Duration,
    /// Upper bound on any single delay.
    pub max_delay: Duration,
}

impl Default for Backoff {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(100),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl Backoff {
    /// The delay to sleep before the given attempt (1-indexed retry).
    ///
    /// Attempt 0 is the initial send and gets no delay.
    pub fn delay(&self, attempt: u32) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }
        let multiplier = 1u64.checked_shl(attempt - 1);
        let delay = multiplier
            .and_then(|m| self.initial_delay.checked_mul(m.min(u32::MAX as u64) as u32))
            .unwrap_or(self.max_delay);
        delay.min(self.max_delay)
    }
}
