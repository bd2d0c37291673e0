//! Execution parameters — per-call model settings.
//!
//! [`ExecutionParams`] groups the static parameters applied to every
//! provider call made by
//! [`EvaluateDocumentUseCase`](crate::use_cases::evaluate::EvaluateDocumentUseCase).
//! These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};

/// Per-call model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionParams {
    /// Maximum tokens a model may produce per answer.
    pub max_answer_tokens: u32,
    /// Sampling temperature for extraction and arbitration calls.
    pub temperature: f32,
    /// Tokens of a provider's context kept free for instructions and the
    /// answer; the rest is the chunking budget.
    pub prompt_reserve_tokens: usize,
}

impl Default for ExecutionParams {
    fn default() -> Self {
        Self {
            max_answer_tokens: 512,
            temperature: 0.0,
            prompt_reserve_tokens: 1_024,
        }
    }
}

impl ExecutionParams {
    // ==================== Builder Methods ====================

    pub fn with_max_answer_tokens(mut self, max: u32) -> Self {
        self.max_answer_tokens = max;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_prompt_reserve_tokens(mut self, reserve: usize) -> Self {
        self.prompt_reserve_tokens = reserve;
        self
    }

    /// Tokens available for document content in a context of
    /// `context_tokens`, never less than a small floor.
    pub fn document_budget(&self, context_tokens: usize) -> usize {
        context_tokens
            .saturating_sub(self.prompt_reserve_tokens)
            .saturating_sub(self.max_answer_tokens as usize)
            .max(MIN_DOCUMENT_BUDGET)
    }
}

/// Smallest chunking budget handed to the engine.
const MIN_DOCUMENT_BUDGET: usize = 256;
