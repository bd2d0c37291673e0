//! Arbitration requests and verdicts

use super::answer::ModelAnswer;
use super::answer_type::AnswerType;
use serde::{Deserialize, Serialize};

/// What the arbitrator decided.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArbitrationChoice {
    /// Index into the candidate list (A = 0, B = 1, C = 2)
    Candidate(usize),
    /// A new answer composed by the arbitrator
    Synthesized(String),
}

/// Parsed arbitrator response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrationVerdict {
    pub choice: ArbitrationChoice,
    /// Missing when the arbitrator did not state one
    pub confidence: Option<f64>,
    pub reasoning: String,
}

/// Everything an arbitrator needs to break a disagreement.
#[derive(Debug, Clone, PartialEq)]
pub struct ArbitrationRequest {
    pub question: String,
    pub answer_type: AnswerType,
    pub candidates: Vec<ModelAnswer>,
    /// Bounded document excerpt for grounding the decision
    pub excerpt: String,
    pub agreement: f64,
}

/// Candidate label used in prompts and verdicts.
pub fn candidate_label(index: usize) -> char {
    (b'A' + (index.min(25)) as u8) as char
}

/// Candidate index for a label, if it names one of `count` candidates.
pub fn candidate_index(label: &str, count: usize) -> Option<usize> {
    let mut chars = label.trim().chars();
    let c = chars.next()?.to_ascii_uppercase();
    if chars.next().is_some() || !c.is_ascii_uppercase() {
        return None;
    }
    let index = (c as u8 - b'A') as usize;
    (index < count).then_some(index)
}
