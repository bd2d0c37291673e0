//! Model answers

use super::answer_type::{AnswerType, UNKNOWN};
use serde::{Deserialize, Serialize};

/// One provider's answer to a question (Value Object)
///
/// Immutable once built; `normalized_text` is derived from `raw_text` for the
/// question's expected answer type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelAnswer {
    pub provider_id: String,
    pub raw_text: String,
    pub normalized_text: String,
    /// Self-reported confidence in `[0, 1]`
    pub confidence: f64,
    pub tokens_used: u64,
}

impl ModelAnswer {
    pub fn new(
        provider_id: impl Into<String>,
        raw_text: impl Into<String>,
        confidence: f64,
        answer_type: AnswerType,
    ) -> Self {
        let raw_text = raw_text.into();
        Self {
            provider_id: provider_id.into(),
            normalized_text: answer_type.normalize(&raw_text),
            raw_text,
            confidence: confidence.clamp(0.0, 1.0),
            tokens_used: 0,
        }
    }

    pub fn with_tokens_used(mut self, tokens_used: u64) -> Self {
        self.tokens_used = tokens_used;
        self
    }

    /// Whether the answer carries anything to compare.
    ///
    /// Empty answers and boolean answers that could not be read as YES or NO
    /// do not take part in consensus.
    pub fn is_usable(&self) -> bool {
        !self.normalized_text.is_empty() && self.normalized_text != UNKNOWN
    }
}
