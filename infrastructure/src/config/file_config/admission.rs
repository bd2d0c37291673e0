//! Admission configuration from TOML (`[admission]` section)

use docquorum_domain::{
    AdmissionPolicy, CircuitPolicy, ConfigIssue, ConfigIssueCode, RetryPolicy,
    config::issues_from_messages,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Admission limits applied to every provider unless overridden.
///
/// # Example
///
/// ```toml
/// [admission]
/// requests_per_minute = 20
/// token_budget_per_minute = 80000
/// max_queue_wait_ms = 60000
/// max_retries = 2
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAdmissionConfig {
    /// Dispatches per trailing minute (0 = unlimited)
    pub requests_per_minute: u32,
    /// Estimated tokens per trailing minute (0 = unlimited)
    pub token_budget_per_minute: u64,
    pub max_queue_depth: usize,
    pub max_queue_wait_ms: u64,
    /// Consecutive failures that open the circuit
    pub failure_threshold: u32,
    pub circuit_cooldown_ms: u64,
    pub max_circuit_cooldown_ms: u64,
    pub max_retries: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

impl Default for FileAdmissionConfig {
    fn default() -> Self {
        Self::from_policy(&AdmissionPolicy::default())
    }
}

impl FileAdmissionConfig {
    fn from_policy(policy: &AdmissionPolicy) -> Self {
        Self {
            requests_per_minute: policy.requests_per_minute,
            token_budget_per_minute: policy.token_budget_per_minute,
            max_queue_depth: policy.max_queue_depth,
            max_queue_wait_ms: millis(policy.max_queue_wait),
            failure_threshold: policy.circuit.failure_threshold,
            circuit_cooldown_ms: millis(policy.circuit.cooldown),
            max_circuit_cooldown_ms: millis(policy.circuit.max_cooldown),
            max_retries: policy.retry.max_retries,
            retry_base_delay_ms: millis(policy.retry.base_delay),
            retry_max_delay_ms: millis(policy.retry.max_delay),
        }
    }

    /// Apply a per-provider override on top of these values.
    pub fn merged(&self, overrides: &FileAdmissionOverride) -> Self {
        Self {
            requests_per_minute: overrides
                .requests_per_minute
                .unwrap_or(self.requests_per_minute),
            token_budget_per_minute: overrides
                .token_budget_per_minute
                .unwrap_or(self.token_budget_per_minute),
            max_queue_depth: overrides.max_queue_depth.unwrap_or(self.max_queue_depth),
            max_queue_wait_ms: overrides.max_queue_wait_ms.unwrap_or(self.max_queue_wait_ms),
            failure_threshold: overrides
                .failure_threshold
                .unwrap_or(self.failure_threshold),
            circuit_cooldown_ms: overrides
                .circuit_cooldown_ms
                .unwrap_or(self.circuit_cooldown_ms),
            max_circuit_cooldown_ms: overrides
                .max_circuit_cooldown_ms
                .unwrap_or(self.max_circuit_cooldown_ms),
            max_retries: overrides.max_retries.unwrap_or(self.max_retries),
            retry_base_delay_ms: overrides
                .retry_base_delay_ms
                .unwrap_or(self.retry_base_delay_ms),
            retry_max_delay_ms: overrides
                .retry_max_delay_ms
                .unwrap_or(self.retry_max_delay_ms),
        }
    }

    /// Convert to a domain `AdmissionPolicy`, returning validation issues.
    ///
    /// Invalid limits fall back to `AdmissionPolicy::default()`.
    pub fn to_policy(&self) -> (AdmissionPolicy, Vec<ConfigIssue>) {
        let policy = AdmissionPolicy::default()
            .with_requests_per_minute(self.requests_per_minute)
            .with_token_budget_per_minute(self.token_budget_per_minute)
            .with_max_queue_depth(self.max_queue_depth)
            .with_max_queue_wait(Duration::from_millis(self.max_queue_wait_ms))
            .with_circuit(CircuitPolicy {
                failure_threshold: self.failure_threshold,
                cooldown: Duration::from_millis(self.circuit_cooldown_ms),
                max_cooldown: Duration::from_millis(self.max_circuit_cooldown_ms),
            })
            .with_retry(RetryPolicy {
                max_retries: self.max_retries,
                base_delay: Duration::from_millis(self.retry_base_delay_ms),
                max_delay: Duration::from_millis(self.retry_max_delay_ms),
            });

        let issues = issues_from_messages(ConfigIssueCode::InvalidAdmission, policy.validate());
        if issues.is_empty() {
            (policy, issues)
        } else {
            (AdmissionPolicy::default(), issues)
        }
    }
}

/// Per-provider admission override (`[providers.<id>.admission]`).
///
/// Unset fields inherit the global `[admission]` section.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileAdmissionOverride {
    pub requests_per_minute: Option<u32>,
    pub token_budget_per_minute: Option<u64>,
    pub max_queue_depth: Option<usize>,
    pub max_queue_wait_ms: Option<u64>,
    pub failure_threshold: Option<u32>,
    pub circuit_cooldown_ms: Option<u64>,
    pub max_circuit_cooldown_ms: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_base_delay_ms: Option<u64>,
    pub retry_max_delay_ms: Option<u64>,
}

fn millis(d: Duration) -> u64 {
    d.as_millis().try_into().unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_domain_policy() {
        let (policy, issues) = FileAdmissionConfig::default().to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy, AdmissionPolicy::default());
    }

    #[test]
    fn test_deserialize_section() {
        let toml_str = r#"
[admission]
requests_per_minute = 20
max_queue_wait_ms = 5000
retry_base_delay_ms = 250
"#;
        let config: super::super::FileConfig = toml::from_str(toml_str).unwrap();
        let (policy, issues) = config.admission.to_policy();
        assert!(issues.is_empty());
        assert_eq!(policy.requests_per_minute, 20);
        assert_eq!(policy.max_queue_wait, Duration::from_secs(5));
        assert_eq!(policy.retry.base_delay, Duration::from_millis(250));
        // Unset keys keep their defaults
        assert_eq!(policy.max_queue_depth, 100);
    }

    #[test]
    fn test_override_merges_field_by_field() {
        let global = FileAdmissionConfig {
            requests_per_minute: 30,
            max_retries: 1,
            ..Default::default()
        };
        let merged = global.merged(&FileAdmissionOverride {
            requests_per_minute: Some(5),
            ..Default::default()
        });
        assert_eq!(merged.requests_per_minute, 5);
        assert_eq!(merged.max_retries, 1);
    }

    #[test]
    fn test_invalid_values_fall_back_to_default() {
        let config = FileAdmissionConfig {
            max_queue_depth: 0,
            retry_base_delay_ms: 5_000,
            retry_max_delay_ms: 100,
            ..Default::default()
        };
        let (policy, issues) = config.to_policy();
        assert_eq!(issues.len(), 2);
        assert!(
            issues
                .iter()
                .all(|i| i.code == ConfigIssueCode::InvalidAdmission)
        );
        assert_eq!(policy, AdmissionPolicy::default());
    }
}
