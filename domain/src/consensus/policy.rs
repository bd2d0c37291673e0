//! Consensus tuning

use serde::{Deserialize, Serialize};

/// Thresholds, bonuses and penalties applied when resolving answers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsensusPolicy {
    /// Agreement at or above which answers count as consensus
    pub agreement_high_threshold: f64,
    /// Agreement below which a disagreement is reported as strong
    pub agreement_low_threshold: f64,
    pub dual_agreement_bonus: f64,
    pub triple_agreement_bonus: f64,
    /// Applied to the best candidate when the arbitrator fails
    pub arbitration_failure_penalty: f64,
    /// Applied when a verdict picks a candidate without stating a confidence
    pub discrepancy_penalty: f64,
    /// Applied when only one provider produced a usable answer
    pub single_fallback_penalty: f64,
    /// Relative difference under which two numbers agree
    pub number_tolerance: f64,
    /// Confidence assumed when a provider reply states none
    pub default_confidence: f64,
    /// Ceiling on consensus confidence
    pub max_confidence: f64,
    /// Bytes of document excerpt handed to the arbitrator
    pub excerpt_bytes: usize,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            agreement_high_threshold: 0.8,
            agreement_low_threshold: 0.5,
            dual_agreement_bonus: 0.1,
            triple_agreement_bonus: 0.15,
            arbitration_failure_penalty: 0.85,
            discrepancy_penalty: 0.8,
            single_fallback_penalty: 0.9,
            number_tolerance: 0.01,
            default_confidence: 0.7,
            max_confidence: 0.99,
            excerpt_bytes: 4_000,
        }
    }
}

impl ConsensusPolicy {
    pub fn with_agreement_thresholds(mut self, high: f64, low: f64) -> Self {
        self.agreement_high_threshold = high;
        self.agreement_low_threshold = low;
        self
    }

    pub fn with_number_tolerance(mut self, tolerance: f64) -> Self {
        self.number_tolerance = tolerance;
        self
    }

    /// Describe how far apart answers are.
    pub fn disagreement_label(&self, agreement: f64) -> &'static str {
        if agreement >= self.agreement_high_threshold {
            "agreement"
        } else if agreement >= self.agreement_low_threshold {
            "partial disagreement"
        } else {
            "strong disagreement"
        }
    }

    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        let unit = |name: &str, value: f64, issues: &mut Vec<String>| {
            if !(0.0..=1.0).contains(&value) {
                issues.push(format!("consensus: {} must be within [0, 1], got {}", name, value));
            }
        };
        unit("agreement_high_threshold", self.agreement_high_threshold, &mut issues);
        unit("agreement_low_threshold", self.agreement_low_threshold, &mut issues);
        unit("dual_agreement_bonus", self.dual_agreement_bonus, &mut issues);
        unit("triple_agreement_bonus", self.triple_agreement_bonus, &mut issues);
        unit("arbitration_failure_penalty", self.arbitration_failure_penalty, &mut issues);
        unit("discrepancy_penalty", self.discrepancy_penalty, &mut issues);
        unit("single_fallback_penalty", self.single_fallback_penalty, &mut issues);
        unit("number_tolerance", self.number_tolerance, &mut issues);
        unit("default_confidence", self.default_confidence, &mut issues);
        unit("max_confidence", self.max_confidence, &mut issues);

        if self.agreement_low_threshold > self.agreement_high_threshold {
            issues.push(format!(
                "consensus: agreement_low_threshold ({}) must not exceed agreement_high_threshold ({})",
                self.agreement_low_threshold, self.agreement_high_threshold
            ));
        }
        if self.excerpt_bytes == 0 {
            issues.push("consensus: excerpt_bytes must be greater than zero".to_string());
        }
        issues
    }
}
