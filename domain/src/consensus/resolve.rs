//! Pure consensus resolution steps
//!
//! The application layer drives these around the (async) arbitrator call:
//!
//! 1. [`assess`] compares the usable answers and either settles the
//!    decision or asks for arbitration.
//! 2. [`apply_verdict`] turns an arbitrator verdict into a decision.
//! 3. [`arbitration_fallback`] recovers when the arbitrator fails.

use super::agreement::{mean_pairwise_agreement, most_agreed};
use super::answer::ModelAnswer;
use super::answer_type::AnswerType;
use super::decision::{ConsensusDecision, SelectedSource};
use super::policy::ConsensusPolicy;
use super::verdict::{ArbitrationChoice, ArbitrationVerdict, candidate_label};

/// Outcome of comparing answers before any arbitration.
#[derive(Debug, Clone, PartialEq)]
pub enum Assessment {
    /// Settled without an arbitrator
    Settled(ConsensusDecision),
    /// Usable answers disagree; `candidates` go to the arbitrator
    NeedsArbitration {
        candidates: Vec<ModelAnswer>,
        agreement: f64,
    },
}

/// Compare answers and settle them when they agree.
///
/// Only usable answers take part. With a single usable answer the result is
/// a `SingleFallback` decision; with none, the most confident raw answer is
/// returned with no agreement.
pub fn assess(
    answers: &[ModelAnswer],
    answer_type: AnswerType,
    policy: &ConsensusPolicy,
) -> Assessment {
    let usable: Vec<ModelAnswer> = answers.iter().filter(|a| a.is_usable()).cloned().collect();

    match usable.len() {
        0 => Assessment::Settled(no_usable_answer(answers, policy)),
        1 => Assessment::Settled(single_fallback(&usable[0], policy)),
        n => {
            let normalized: Vec<&str> = usable.iter().map(|a| a.normalized_text.as_str()).collect();
            let agreement =
                mean_pairwise_agreement(answer_type, &normalized, policy.number_tolerance);
            if agreement < policy.agreement_high_threshold {
                return Assessment::NeedsArbitration {
                    candidates: usable,
                    agreement,
                };
            }

            let bonus = if n == 2 {
                policy.dual_agreement_bonus
            } else {
                policy.triple_agreement_bonus
            };
            let average = usable.iter().map(|a| a.confidence).sum::<f64>() / n as f64;
            let pick = most_agreed(answer_type, &normalized, policy.number_tolerance);
            let decision = ConsensusDecision::new(
                usable[pick].normalized_text.clone(),
                (average + bonus).min(policy.max_confidence),
                SelectedSource::Primary,
                agreement,
                format!(
                    "All {} answers agree (agreement {:.2}); confidence is the average {:.2} plus a {:.2} agreement bonus",
                    n, agreement, average, bonus
                ),
            )
            .with_candidates(answers.to_vec());
            Assessment::Settled(decision)
        }
    }
}

/// Decision from an arbitrator verdict over `candidates`.
///
/// A verdict without a stated confidence takes the chosen candidate's
/// confidence (the mean for a synthesized answer) times the discrepancy
/// penalty.
pub fn apply_verdict(
    candidates: &[ModelAnswer],
    verdict: &ArbitrationVerdict,
    answer_type: AnswerType,
    agreement: f64,
    policy: &ConsensusPolicy,
) -> ConsensusDecision {
    let (answer, confidence, picked) = match &verdict.choice {
        ArbitrationChoice::Candidate(index) => {
            let chosen = &candidates[(*index).min(candidates.len().saturating_sub(1))];
            let confidence = verdict
                .confidence
                .unwrap_or(chosen.confidence * policy.discrepancy_penalty);
            (
                chosen.normalized_text.clone(),
                confidence,
                format!("candidate {} ({})", candidate_label(*index), chosen.provider_id),
            )
        }
        ArbitrationChoice::Synthesized(text) => {
            let mean = if candidates.is_empty() {
                policy.default_confidence
            } else {
                candidates.iter().map(|a| a.confidence).sum::<f64>() / candidates.len() as f64
            };
            let confidence = verdict
                .confidence
                .unwrap_or(mean * policy.discrepancy_penalty);
            (answer_type.normalize(text), confidence, "a synthesized answer".to_string())
        }
    };

    let mut reasoning = format!(
        "Answers showed {} (agreement {:.2}); arbitrator chose {}",
        policy.disagreement_label(agreement),
        agreement,
        picked
    );
    if verdict.confidence.is_none() {
        reasoning.push_str(" without stating a confidence");
    }
    if !verdict.reasoning.is_empty() {
        reasoning.push_str(": ");
        reasoning.push_str(&verdict.reasoning);
    }

    ConsensusDecision::new(
        answer,
        confidence,
        SelectedSource::Arbitrated,
        agreement,
        reasoning,
    )
    .with_candidates(candidates.to_vec())
}

/// Decision when arbitration failed: the most confident candidate with the
/// arbitration failure penalty.
///
/// Ties go to the earlier candidate. The source is `Primary` for the first
/// candidate and `Secondary` otherwise.
pub fn arbitration_fallback(
    candidates: &[ModelAnswer],
    agreement: f64,
    failure: &str,
    policy: &ConsensusPolicy,
) -> ConsensusDecision {
    let Some((index, best)) = candidates
        .iter()
        .enumerate()
        .fold(None::<(usize, &ModelAnswer)>, |best, (i, a)| match best {
            Some((_, b)) if b.confidence >= a.confidence => best,
            _ => Some((i, a)),
        })
    else {
        return ConsensusDecision::new(
            "",
            0.0,
            SelectedSource::SingleFallback,
            0.0,
            format!("Arbitration failed ({}) and no candidates remain", failure),
        );
    };

    let source = if index == 0 {
        SelectedSource::Primary
    } else {
        SelectedSource::Secondary
    };
    ConsensusDecision::new(
        best.normalized_text.clone(),
        best.confidence * policy.arbitration_failure_penalty,
        source,
        agreement,
        format!(
            "Answers showed {} (agreement {:.2}) and arbitration failed ({}); kept the most confident answer from {} with a {:.2} penalty",
            policy.disagreement_label(agreement),
            agreement,
            failure,
            best.provider_id,
            policy.arbitration_failure_penalty
        ),
    )
    .with_candidates(candidates.to_vec())
}

fn single_fallback(answer: &ModelAnswer, policy: &ConsensusPolicy) -> ConsensusDecision {
    ConsensusDecision::new(
        answer.normalized_text.clone(),
        answer.confidence * policy.single_fallback_penalty,
        SelectedSource::SingleFallback,
        1.0,
        format!(
            "Only {} produced a usable answer; no independent check was possible",
            answer.provider_id
        ),
    )
    .with_candidates(vec![answer.clone()])
}

fn no_usable_answer(answers: &[ModelAnswer], policy: &ConsensusPolicy) -> ConsensusDecision {
    let best = answers
        .iter()
        .max_by(|a, b| a.confidence.total_cmp(&b.confidence));
    match best {
        Some(answer) => ConsensusDecision::new(
            answer.normalized_text.clone(),
            answer.confidence * policy.single_fallback_penalty * policy.discrepancy_penalty,
            SelectedSource::SingleFallback,
            0.0,
            "No provider produced a usable answer; returning the most confident reply as-is",
        )
        .with_candidates(answers.to_vec()),
        None => ConsensusDecision::new(
            "",
            0.0,
            SelectedSource::SingleFallback,
            0.0,
            "No answers were provided",
        ),
    }
}
