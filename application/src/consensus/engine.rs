//! Consensus engine: settles 1-3 answers, arbitrating disagreements

use crate::ports::arbitrator::Arbitrator;
use crate::ports::progress::{EvaluationProgress, NoProgress};
use docquorum_domain::consensus::{Assessment, apply_verdict, arbitration_fallback, assess};
use docquorum_domain::core::string::floor_char_boundary;
use docquorum_domain::{
    AnswerType, ArbitrationError, ArbitrationRequest, ConsensusDecision, ConsensusPolicy,
    ModelAnswer, ResolutionPhase, SelectedSource,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turns independently obtained answers into one decision.
///
/// `resolve` never fails: arbitrator errors (including having no
/// arbitrator) degrade the decision to a penalized fallback.
pub struct ConsensusEngine {
    policy: ConsensusPolicy,
    arbitrator: Option<Arc<dyn Arbitrator>>,
}

impl ConsensusEngine {
    pub fn new(policy: ConsensusPolicy) -> Self {
        Self {
            policy,
            arbitrator: None,
        }
    }

    pub fn with_arbitrator(mut self, arbitrator: Arc<dyn Arbitrator>) -> Self {
        self.arbitrator = Some(arbitrator);
        self
    }

    pub fn policy(&self) -> &ConsensusPolicy {
        &self.policy
    }

    pub fn has_arbitrator(&self) -> bool {
        self.arbitrator.is_some()
    }

    /// Settle `answers` to `question`.
    ///
    /// `excerpt` grounds the arbitrator; it is cut to the policy's excerpt
    /// size.
    pub async fn resolve(
        &self,
        question: &str,
        answer_type: AnswerType,
        answers: &[ModelAnswer],
        excerpt: &str,
    ) -> ConsensusDecision {
        self.resolve_with_progress(question, answer_type, answers, excerpt, &NoProgress)
            .await
    }

    /// [`resolve`](Self::resolve), reporting phase changes to `progress`.
    pub async fn resolve_with_progress(
        &self,
        question: &str,
        answer_type: AnswerType,
        answers: &[ModelAnswer],
        excerpt: &str,
        progress: &dyn EvaluationProgress,
    ) -> ConsensusDecision {
        let mut phase = ResolutionPhase::Pending;

        let decision = match assess(answers, answer_type, &self.policy) {
            Assessment::Settled(decision) => {
                let next = if decision.selected_source == SelectedSource::SingleFallback {
                    ResolutionPhase::Arbitrating
                } else {
                    ResolutionPhase::Consensus
                };
                phase = advance(phase, next, progress);
                info!(
                    "Settled without arbitration ({}, agreement {:.2})",
                    decision.selected_source, decision.agreement_score
                );
                decision
            }
            Assessment::NeedsArbitration {
                candidates,
                agreement,
            } => {
                phase = advance(phase, ResolutionPhase::Arbitrating, progress);
                info!(
                    "{} answers show {} (agreement {:.2}), arbitrating",
                    candidates.len(),
                    self.policy.disagreement_label(agreement),
                    agreement
                );
                let request = ArbitrationRequest {
                    question: question.to_string(),
                    answer_type,
                    candidates,
                    excerpt: bounded_excerpt(excerpt, self.policy.excerpt_bytes).to_string(),
                    agreement,
                };
                self.arbitrate(&request).await
            }
        };

        advance(phase, ResolutionPhase::Resolved, progress);
        debug!(
            "Final answer '{}' with confidence {:.2}",
            decision.final_answer, decision.final_confidence
        );
        decision
    }

    async fn arbitrate(&self, request: &ArbitrationRequest) -> ConsensusDecision {
        let result = match &self.arbitrator {
            Some(arbitrator) => {
                debug!("Consulting arbitrator {}", arbitrator.id());
                arbitrator.arbitrate(request).await
            }
            None => Err(ArbitrationError::Unavailable),
        };

        match result {
            Ok(verdict) => apply_verdict(
                &request.candidates,
                &verdict,
                request.answer_type,
                request.agreement,
                &self.policy,
            ),
            Err(e) => {
                warn!("Arbitration failed: {}", e);
                arbitration_fallback(
                    &request.candidates,
                    request.agreement,
                    &e.to_string(),
                    &self.policy,
                )
            }
        }
    }
}

fn advance(
    phase: ResolutionPhase,
    next: ResolutionPhase,
    progress: &dyn EvaluationProgress,
) -> ResolutionPhase {
    let phase = match phase.advance(next) {
        Ok(phase) => phase,
        Err(e) => {
            warn!("{}", e);
            next
        }
    };
    progress.on_phase(phase);
    phase
}

/// Leading part of `excerpt` of at most `max_bytes`, cut on a char boundary.
fn bounded_excerpt(excerpt: &str, max_bytes: usize) -> &str {
    &excerpt[..floor_char_boundary(excerpt, max_bytes)]
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docquorum_domain::{ArbitrationChoice, ArbitrationVerdict, ChunkPlan};
    use std::sync::Mutex;

    struct MockArbitrator {
        result: Result<ArbitrationVerdict, ArbitrationError>,
        requests: Mutex<Vec<ArbitrationRequest>>,
    }

    impl MockArbitrator {
        fn new(result: Result<ArbitrationVerdict, ArbitrationError>) -> Arc<Self> {
            Arc::new(Self {
                result,
                requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl Arbitrator for MockArbitrator {
        fn id(&self) -> &str {
            "judge"
        }

        async fn arbitrate(
            &self,
            request: &ArbitrationRequest,
        ) -> Result<ArbitrationVerdict, ArbitrationError> {
            self.requests.lock().unwrap().push(request.clone());
            self.result.clone()
        }
    }

    #[derive(Default)]
    struct PhaseRecorder {
        phases: Mutex<Vec<ResolutionPhase>>,
    }

    impl EvaluationProgress for PhaseRecorder {
        fn on_evaluation_start(&self, _providers: &[String]) {}
        fn on_chunked(&self, _provider: &str, _plan: &ChunkPlan) {}
        fn on_provider_complete(&self, _provider: &str, _success: bool) {}
        fn on_phase(&self, phase: ResolutionPhase) {
            self.phases.lock().unwrap().push(phase);
        }
        fn on_decision(&self, _decision: &ConsensusDecision) {}
    }

    fn answer(provider: &str, raw: &str, confidence: f64, answer_type: AnswerType) -> ModelAnswer {
        ModelAnswer::new(provider, raw, confidence, answer_type)
    }

    fn verdict(choice: ArbitrationChoice, confidence: Option<f64>) -> ArbitrationVerdict {
        ArbitrationVerdict {
            choice,
            confidence,
            reasoning: "Clause 4 excludes flood".to_string(),
        }
    }

    // ==================== Consensus ====================

    #[tokio::test]
    async fn test_dual_consensus_adds_bonus() {
        let engine = ConsensusEngine::new(ConsensusPolicy::default());
        let answers = vec![
            answer("alpha", "Yes, it is covered", 0.8, AnswerType::Boolean),
            answer("beta", "yes", 0.9, AnswerType::Boolean),
        ];

        let decision = engine
            .resolve("Is fire covered?", AnswerType::Boolean, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "YES");
        assert_eq!(decision.selected_source, SelectedSource::Primary);
        assert!((decision.final_confidence - 0.95).abs() < 1e-9);
        assert_eq!(decision.agreement_score, 1.0);
    }

    #[tokio::test]
    async fn test_triple_consensus_is_capped() {
        let engine = ConsensusEngine::new(ConsensusPolicy::default());
        let answers = vec![
            answer("alpha", "$1,000", 0.95, AnswerType::Number),
            answer("beta", "1000 dollars", 0.9, AnswerType::Number),
            answer("gamma", "1,000.00", 0.92, AnswerType::Number),
        ];

        let decision = engine
            .resolve("What is the deductible?", AnswerType::Number, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "1000");
        assert_eq!(decision.selected_source, SelectedSource::Primary);
        assert!((decision.final_confidence - 0.99).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_consensus_skips_arbitrator() {
        let arbitrator = MockArbitrator::new(Err(ArbitrationError::Unavailable));
        let engine =
            ConsensusEngine::new(ConsensusPolicy::default()).with_arbitrator(arbitrator.clone());
        let answers = vec![
            answer("alpha", "No", 0.7, AnswerType::Boolean),
            answer("beta", "no", 0.7, AnswerType::Boolean),
        ];

        engine
            .resolve("Is flood covered?", AnswerType::Boolean, &answers, "")
            .await;
        assert!(arbitrator.requests.lock().unwrap().is_empty());
    }

    // ==================== Arbitration ====================

    #[tokio::test]
    async fn test_disagreement_uses_verdict() {
        let arbitrator = MockArbitrator::new(Ok(verdict(ArbitrationChoice::Candidate(1), Some(0.88))));
        let engine =
            ConsensusEngine::new(ConsensusPolicy::default()).with_arbitrator(arbitrator.clone());
        let answers = vec![
            answer("alpha", "Yes", 0.9, AnswerType::Boolean),
            answer("beta", "No", 0.85, AnswerType::Boolean),
        ];

        let decision = engine
            .resolve(
                "Is flood covered?",
                AnswerType::Boolean,
                &answers,
                "Flood is excluded.",
            )
            .await;

        assert_eq!(decision.final_answer, "NO");
        assert_eq!(decision.selected_source, SelectedSource::Arbitrated);
        assert!((decision.final_confidence - 0.88).abs() < 1e-9);

        let requests = arbitrator.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].candidates.len(), 2);
        assert_eq!(requests[0].excerpt, "Flood is excluded.");
        assert_eq!(requests[0].agreement, 0.0);
    }

    #[tokio::test]
    async fn test_verdict_without_confidence_is_penalized() {
        let arbitrator = MockArbitrator::new(Ok(verdict(ArbitrationChoice::Candidate(0), None)));
        let engine = ConsensusEngine::new(ConsensusPolicy::default()).with_arbitrator(arbitrator);
        let answers = vec![
            answer("alpha", "Yes", 0.9, AnswerType::Boolean),
            answer("beta", "No", 0.85, AnswerType::Boolean),
        ];

        let decision = engine
            .resolve("Is flood covered?", AnswerType::Boolean, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "YES");
        assert!((decision.final_confidence - 0.72).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_synthesized_verdict_is_normalized() {
        let arbitrator = MockArbitrator::new(Ok(verdict(
            ArbitrationChoice::Synthesized("  The Acme   Insurance Co ".to_string()),
            Some(0.7),
        )));
        let engine = ConsensusEngine::new(ConsensusPolicy::default()).with_arbitrator(arbitrator);
        let answers = vec![
            answer("alpha", "Acme Corp", 0.8, AnswerType::Text),
            answer("beta", "Zenith Mutual", 0.8, AnswerType::Text),
        ];

        let decision = engine
            .resolve("Who is the insurer?", AnswerType::Text, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "the acme insurance co");
        assert_eq!(decision.selected_source, SelectedSource::Arbitrated);
    }

    #[tokio::test]
    async fn test_arbitration_failure_falls_back() {
        let arbitrator =
            MockArbitrator::new(Err(ArbitrationError::CallFailed("timeout".to_string())));
        let engine = ConsensusEngine::new(ConsensusPolicy::default()).with_arbitrator(arbitrator);
        let answers = vec![
            answer("alpha", "Yes", 0.6, AnswerType::Boolean),
            answer("beta", "No", 0.9, AnswerType::Boolean),
        ];

        let decision = engine
            .resolve("Is flood covered?", AnswerType::Boolean, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "NO");
        assert_eq!(decision.selected_source, SelectedSource::Secondary);
        assert!((decision.final_confidence - 0.765).abs() < 1e-9);
        assert!(decision.reasoning.contains("arbitration failed"));
    }

    #[tokio::test]
    async fn test_missing_arbitrator_falls_back() {
        let engine = ConsensusEngine::new(ConsensusPolicy::default());
        let answers = vec![
            answer("alpha", "Yes", 0.9, AnswerType::Boolean),
            answer("beta", "No", 0.9, AnswerType::Boolean),
        ];

        let decision = engine
            .resolve("Is flood covered?", AnswerType::Boolean, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "YES");
        assert_eq!(decision.selected_source, SelectedSource::Primary);
        assert!((decision.final_confidence - 0.765).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_answer_fallback() {
        let engine = ConsensusEngine::new(ConsensusPolicy::default());
        let answers = vec![answer("alpha", "03/15/2024", 0.8, AnswerType::Date)];

        let decision = engine
            .resolve("When does the policy start?", AnswerType::Date, &answers, "")
            .await;

        assert_eq!(decision.final_answer, "03-15-24");
        assert_eq!(decision.selected_source, SelectedSource::SingleFallback);
        assert!((decision.final_confidence - 0.72).abs() < 1e-9);
    }

    // ==================== Phases ====================

    #[tokio::test]
    async fn test_phases_for_consensus_and_arbitration() {
        let engine = ConsensusEngine::new(ConsensusPolicy::default());

        let agree = vec![
            answer("alpha", "yes", 0.9, AnswerType::Boolean),
            answer("beta", "yes", 0.9, AnswerType::Boolean),
        ];
        let recorder = PhaseRecorder::default();
        engine
            .resolve_with_progress("q?", AnswerType::Boolean, &agree, "", &recorder)
            .await;
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![ResolutionPhase::Consensus, ResolutionPhase::Resolved]
        );

        let disagree = vec![
            answer("alpha", "yes", 0.9, AnswerType::Boolean),
            answer("beta", "no", 0.9, AnswerType::Boolean),
        ];
        let recorder = PhaseRecorder::default();
        engine
            .resolve_with_progress("q?", AnswerType::Boolean, &disagree, "", &recorder)
            .await;
        assert_eq!(
            *recorder.phases.lock().unwrap(),
            vec![ResolutionPhase::Arbitrating, ResolutionPhase::Resolved]
        );
    }

    #[test]
    fn test_bounded_excerpt_respects_char_boundary() {
        assert_eq!(bounded_excerpt("héllo", 2), "h");
        assert_eq!(bounded_excerpt("hello", 10), "hello");
    }
}
