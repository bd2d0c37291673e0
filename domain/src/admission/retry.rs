//! Retry backoff policy

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Bounded exponential backoff with jitter for transient failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Retries after the first attempt (0 = single attempt)
    pub max_retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

impl RetryPolicy {
    pub fn none() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Whether another attempt is allowed after `retries_done` retries.
    pub fn allows_retry(&self, retries_done: u32) -> bool {
        retries_done < self.max_retries
    }

    /// Delay before retry number `retry` (0-based).
    ///
    /// `jitter` is a sample from `[0, 1]`; the capped exponential delay is
    /// scaled into `[50%, 100%]` of its value.
    pub fn delay_for(&self, retry: u32, jitter: f64) -> Duration {
        let exponent = retry.min(16);
        let ceiling = self
            .base_delay
            .saturating_mul(1u32 << exponent)
            .min(self.max_delay);
        let factor = 0.5 + 0.5 * jitter.clamp(0.0, 1.0);
        ceiling.mul_f64(factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allows_retry() {
        let policy = RetryPolicy::default();
        assert!(policy.allows_retry(0));
        assert!(policy.allows_retry(2));
        assert!(!policy.allows_retry(3));
        assert!(!RetryPolicy::none().allows_retry(0));
    }

    #[test]
    fn test_delay_grows_exponentially() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(0, 1.0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1, 1.0), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(2, 1.0), Duration::from_millis(2000));
    }

    #[test]
    fn test_delay_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(10, 1.0), Duration::from_secs(10));
    }

    #[test]
    fn test_jitter_range() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1, 0.0), Duration::from_millis(500));
        assert_eq!(policy.delay_for(1, 0.5), Duration::from_millis(750));
        // Out-of-range samples are clamped
        assert_eq!(policy.delay_for(1, 7.0), Duration::from_millis(1000));
    }
}
