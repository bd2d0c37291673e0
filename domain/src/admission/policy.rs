//! Admission limits enforced by one controller.

use super::circuit::CircuitPolicy;
use super::retry::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Limits for a single provider's admission controller.
///
/// # Example
///
/// ```
/// use docquorum_domain::admission::AdmissionPolicy;
/// use std::time::Duration;
///
/// let policy = AdmissionPolicy::default()
///     .with_requests_per_minute(20)
///     .with_max_queue_wait(Duration::from_secs(30));
/// assert_eq!(policy.requests_per_minute, 20);
/// assert!(policy.validate().is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdmissionPolicy {
    /// Dispatches allowed per trailing 60 s (0 = unlimited)
    pub requests_per_minute: u32,
    /// Estimated tokens allowed per trailing 60 s (0 = unlimited)
    pub token_budget_per_minute: u64,
    /// Queue length at which new submissions are rejected
    pub max_queue_depth: usize,
    /// Longest an operation may wait in the queue
    pub max_queue_wait: Duration,
    pub circuit: CircuitPolicy,
    pub retry: RetryPolicy,
}

impl Default for AdmissionPolicy {
    fn default() -> Self {
        Self {
            requests_per_minute: 50,
            token_budget_per_minute: 100_000,
            max_queue_depth: 100,
            max_queue_wait: Duration::from_secs(120),
            circuit: CircuitPolicy::default(),
            retry: RetryPolicy::default(),
        }
    }
}

impl AdmissionPolicy {
    // ==================== Builder Methods ====================

    pub fn with_requests_per_minute(mut self, rpm: u32) -> Self {
        self.requests_per_minute = rpm;
        self
    }

    pub fn with_token_budget_per_minute(mut self, tokens: u64) -> Self {
        self.token_budget_per_minute = tokens;
        self
    }

    pub fn with_max_queue_depth(mut self, depth: usize) -> Self {
        self.max_queue_depth = depth;
        self
    }

    pub fn with_max_queue_wait(mut self, wait: Duration) -> Self {
        self.max_queue_wait = wait;
        self
    }

    pub fn with_circuit(mut self, circuit: CircuitPolicy) -> Self {
        self.circuit = circuit;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    // ==================== Validation ====================

    /// Validate the limits, returning a list of issues.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.max_queue_depth == 0 {
            issues.push("admission: max_queue_depth must be >= 1".to_string());
        }
        if self.max_queue_wait.is_zero() {
            issues.push("admission: max_queue_wait must be > 0".to_string());
        }
        if self.circuit.max_cooldown < self.circuit.cooldown {
            issues.push(format!(
                "admission: max_circuit_cooldown ({:?}) must be >= circuit_cooldown ({:?})",
                self.circuit.max_cooldown, self.circuit.cooldown
            ));
        }
        if self.retry.max_delay < self.retry.base_delay {
            issues.push(format!(
                "admission: retry_max_delay ({:?}) must be >= retry_base_delay ({:?})",
                self.retry.max_delay, self.retry.base_delay
            ));
        }
        issues
    }
}
