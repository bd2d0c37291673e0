//! Circuit breaker state

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Thresholds for opening the circuit.
///
/// `failure_threshold == 0` disables the breaker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitPolicy {
    pub failure_threshold: u32,
    pub cooldown: Duration,
    pub max_cooldown: Duration,
}

impl Default for CircuitPolicy {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            cooldown: Duration::from_secs(30),
            max_cooldown: Duration::from_secs(300),
        }
    }
}

impl CircuitPolicy {
    /// Cool-down for the `opening`-th consecutive opening (1-based).
    ///
    /// Doubles with each opening and never exceeds `max_cooldown`.
    pub fn cooldown_for(&self, opening: u32) -> Duration {
        let exponent = opening.saturating_sub(1).min(16);
        self.cooldown
            .saturating_mul(1u32 << exponent)
            .min(self.max_cooldown.max(self.cooldown))
    }
}

/// Consecutive-failure circuit breaker.
///
/// Closed → open once `failure_threshold` terminal failures happen in a row.
/// Open → closed when the cool-down elapses, or immediately on a success.
/// While `now < open_until` nothing may be dispatched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CircuitState {
    consecutive_failures: u32,
    open_until: Option<Instant>,
    openings: u32,
}

impl CircuitState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn open_until(&self) -> Option<Instant> {
        self.open_until
    }

    /// Whether dispatch is currently blocked.
    pub fn is_open(&self, now: Instant) -> bool {
        self.open_until.is_some_and(|until| now < until)
    }

    /// Time left before the cool-down ends, if open.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.open_until
            .filter(|until| now < *until)
            .map(|until| until - now)
    }

    /// Record a successful call. Returns `true` if this closed an open circuit.
    pub fn record_success(&mut self) -> bool {
        let was_open = self.open_until.is_some();
        self.consecutive_failures = 0;
        self.openings = 0;
        self.open_until = None;
        was_open
    }

    /// Record a terminal failure.
    ///
    /// Returns the cool-down applied when this failure (re)opened the circuit.
    pub fn record_failure(&mut self, now: Instant, policy: &CircuitPolicy) -> Option<Duration> {
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
        if policy.failure_threshold == 0 || self.consecutive_failures < policy.failure_threshold {
            return None;
        }
        self.openings = self.openings.saturating_add(1);
        let cooldown = policy.cooldown_for(self.openings);
        self.open_until = Some(now + cooldown);
        Some(cooldown)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
