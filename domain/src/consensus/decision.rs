//! Consensus decisions and the resolution state machine

use super::answer::ModelAnswer;
use crate::core::error::DomainError;
use serde::{Deserialize, Serialize};

/// Where the final answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectedSource {
    /// Consensus, or the first answer after a failed arbitration
    Primary,
    /// A later answer picked after a failed arbitration
    Secondary,
    /// Chosen or synthesized by the arbitrator
    Arbitrated,
    /// Only one provider produced a usable answer
    SingleFallback,
}

impl SelectedSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SelectedSource::Primary => "primary",
            SelectedSource::Secondary => "secondary",
            SelectedSource::Arbitrated => "arbitrated",
            SelectedSource::SingleFallback => "single-fallback",
        }
    }

    /// Whether the decision skipped an independent check.
    pub fn is_degraded(&self) -> bool {
        matches!(self, SelectedSource::Secondary | SelectedSource::SingleFallback)
    }
}

impl std::fmt::Display for SelectedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal output of one evaluation (Value Object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsensusDecision {
    pub final_answer: String,
    /// In `[0, 1]`
    pub final_confidence: f64,
    pub selected_source: SelectedSource,
    /// In `[0, 1]`
    pub agreement_score: f64,
    pub reasoning: String,
    /// Answers the decision was made from
    #[serde(default)]
    pub candidates: Vec<ModelAnswer>,
}

impl ConsensusDecision {
    pub fn new(
        final_answer: impl Into<String>,
        final_confidence: f64,
        selected_source: SelectedSource,
        agreement_score: f64,
        reasoning: impl Into<String>,
    ) -> Self {
        Self {
            final_answer: final_answer.into(),
            final_confidence: final_confidence.clamp(0.0, 1.0),
            selected_source,
            agreement_score: agreement_score.clamp(0.0, 1.0),
            reasoning: reasoning.into(),
            candidates: Vec::new(),
        }
    }

    pub fn with_candidates(mut self, candidates: Vec<ModelAnswer>) -> Self {
        self.candidates = candidates;
        self
    }
}

/// Per-evaluation resolution state.
///
/// ```text
/// Pending ──► Consensus ───┐
///    │                     ├──► Resolved
///    └──────► Arbitrating ─┘
/// ```
///
/// Single-answer fallbacks go through `Arbitrating`, so every evaluation
/// reaches `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionPhase {
    #[default]
    Pending,
    Consensus,
    Arbitrating,
    Resolved,
}

impl ResolutionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionPhase::Pending => "pending",
            ResolutionPhase::Consensus => "consensus",
            ResolutionPhase::Arbitrating => "arbitrating",
            ResolutionPhase::Resolved => "resolved",
        }
    }

    pub fn can_advance_to(&self, next: ResolutionPhase) -> bool {
        matches!(
            (self, next),
            (ResolutionPhase::Pending, ResolutionPhase::Consensus)
                | (ResolutionPhase::Pending, ResolutionPhase::Arbitrating)
                | (ResolutionPhase::Consensus, ResolutionPhase::Resolved)
                | (ResolutionPhase::Arbitrating, ResolutionPhase::Resolved)
        )
    }

    /// Move to `next`, rejecting transitions outside the state machine.
    pub fn advance(self, next: ResolutionPhase) -> Result<ResolutionPhase, DomainError> {
        if self.can_advance_to(next) {
            Ok(next)
        } else {
            Err(DomainError::InvalidPhaseTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == ResolutionPhase::Resolved
    }
}

impl std::fmt::Display for ResolutionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        let consensus = ResolutionPhase::Pending
            .advance(ResolutionPhase::Consensus)
            .and_then(|p| p.advance(ResolutionPhase::Resolved));
        assert_eq!(consensus, Ok(ResolutionPhase::Resolved));

        let arbitrated = ResolutionPhase::Pending
            .advance(ResolutionPhase::Arbitrating)
            .and_then(|p| p.advance(ResolutionPhase::Resolved));
        assert_eq!(arbitrated, Ok(ResolutionPhase::Resolved));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(ResolutionPhase::Pending.advance(ResolutionPhase::Resolved).is_err());
        assert!(ResolutionPhase::Resolved.advance(ResolutionPhase::Consensus).is_err());
        assert!(ResolutionPhase::Consensus.advance(ResolutionPhase::Arbitrating).is_err());
    }

    #[test]
    fn test_decision_clamps() {
        let decision = ConsensusDecision::new("YES", 1.2, SelectedSource::Primary, -0.1, "");
        assert_eq!(decision.final_confidence, 1.0);
        assert_eq!(decision.agreement_score, 0.0);
    }

    #[test]
    fn test_source_serializes_kebab_case() {
        let json = serde_json::to_string(&SelectedSource::SingleFallback).unwrap();
        assert_eq!(json, "\"single-fallback\"");
    }
}
