//! Evaluate Document use case
//!
//! Answers one question about one document with 1-3 independent providers
//! and settles their answers into a single decision.

use crate::admission::{Admission, AdmissionController, AdmissionError};
use crate::chunking::ChunkingService;
use crate::config::ExecutionParams;
use crate::consensus::ConsensusEngine;
use crate::ports::decision_logger::{DecisionLogger, DecisionRecord, NoDecisionLogger};
use crate::ports::progress::{EvaluationProgress, NoProgress};
use crate::ports::provider::{Provider, ProviderError, ProviderRequest};
use docquorum_domain::chunking::estimate_tokens;
use docquorum_domain::consensus::parse_answer_reply;
use docquorum_domain::{
    AnswerType, ChunkPlan, ChunkingError, ConsensusDecision, DocumentChunk, ModelAnswer,
    PromptTemplate, Question,
};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::{self, JoinSet};
use tracing::{debug, info, warn};

/// Errors that can occur during an evaluation
#[derive(Error, Debug)]
pub enum EvaluateError {
    #[error("Between 1 and 3 providers are required, got {0}")]
    InvalidProviderCount(usize),

    #[error("Chunking failed: {0}")]
    Chunking(#[from] ChunkingError),

    #[error("Provider {provider} failed: {source}")]
    Provider {
        provider: String,
        source: ProviderError,
    },

    #[error("All providers failed: {}", format_failures(.0))]
    AllProvidersFailed(Vec<(String, String)>),
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(provider, error)| format!("{} ({})", provider, error))
        .collect::<Vec<_>>()
        .join(", ")
}

/// How many independent answers an evaluation collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvaluationMode {
    Single,
    Dual,
    Triple,
}

impl EvaluationMode {
    pub fn for_provider_count(count: usize) -> Option<Self> {
        match count {
            1 => Some(EvaluationMode::Single),
            2 => Some(EvaluationMode::Dual),
            3 => Some(EvaluationMode::Triple),
            _ => None,
        }
    }

    pub fn provider_count(&self) -> usize {
        match self {
            EvaluationMode::Single => 1,
            EvaluationMode::Dual => 2,
            EvaluationMode::Triple => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationMode::Single => "single",
            EvaluationMode::Dual => "dual",
            EvaluationMode::Triple => "triple",
        }
    }
}

impl std::fmt::Display for EvaluationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One answering provider with its admission controller.
#[derive(Clone)]
pub struct ProviderSlot {
    pub id: String,
    pub model: String,
    /// Context window of the model, in tokens
    pub context_tokens: usize,
    pub provider: Arc<dyn Provider>,
    pub controller: Arc<AdmissionController>,
}

/// Input for the EvaluateDocument use case
#[derive(Debug, Clone)]
pub struct EvaluateInput {
    pub document: String,
    pub question: Question,
    pub expected_type: AnswerType,
}

impl EvaluateInput {
    pub fn new(
        document: impl Into<String>,
        question: impl Into<Question>,
        expected_type: AnswerType,
    ) -> Self {
        Self {
            document: document.into(),
            question: question.into(),
            expected_type,
        }
    }
}

/// Use case for answering a question about a document
pub struct EvaluateDocumentUseCase {
    providers: Vec<ProviderSlot>,
    chunking: Arc<ChunkingService>,
    consensus: Arc<ConsensusEngine>,
    params: ExecutionParams,
    logger: Arc<dyn DecisionLogger>,
}

impl EvaluateDocumentUseCase {
    pub fn new(
        providers: Vec<ProviderSlot>,
        chunking: Arc<ChunkingService>,
        consensus: Arc<ConsensusEngine>,
    ) -> Self {
        Self {
            providers,
            chunking,
            consensus,
            params: ExecutionParams::default(),
            logger: Arc::new(NoDecisionLogger),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_decision_logger(mut self, logger: Arc<dyn DecisionLogger>) -> Self {
        self.logger = logger;
        self
    }

    /// Mode implied by the configured providers.
    pub fn mode(&self) -> Result<EvaluationMode, EvaluateError> {
        EvaluationMode::for_provider_count(self.providers.len())
            .ok_or(EvaluateError::InvalidProviderCount(self.providers.len()))
    }

    /// Execute the use case with default (no-op) progress
    pub async fn execute(&self, input: EvaluateInput) -> Result<ConsensusDecision, EvaluateError> {
        self.execute_with_progress(input, &NoProgress).await
    }

    /// Execute the use case with progress callbacks
    pub async fn execute_with_progress(
        &self,
        input: EvaluateInput,
        progress: &dyn EvaluationProgress,
    ) -> Result<ConsensusDecision, EvaluateError> {
        let mode = self.mode()?;
        info!(
            "Evaluating in {} mode ({} bytes, expecting {})",
            mode,
            input.document.len(),
            input.expected_type
        );

        // Chunking is deterministic and fails the same way for every
        // provider, so it happens up front.
        let mut plans = Vec::with_capacity(self.providers.len());
        for slot in &self.providers {
            let budget = self.params.document_budget(slot.context_tokens);
            let plan = self.chunking.chunk(&input.document, &input.question, budget)?;
            debug!(
                "Provider {}: {} chunks for a {} token budget",
                slot.id,
                plan.chunks.len(),
                budget
            );
            progress.on_chunked(&slot.id, &plan);
            plans.push((plan, budget));
        }

        let ids: Vec<String> = self.providers.iter().map(|s| s.id.clone()).collect();
        progress.on_evaluation_start(&ids);

        let outcomes = self.query_providers(&input, &plans, progress).await;

        let mut answers = Vec::new();
        let mut failures = Vec::new();
        let mut first_fatal = None;
        for (id, outcome) in outcomes {
            match outcome {
                Ok(answer) => answers.push(answer),
                Err(e) => {
                    if first_fatal.is_none()
                        && let AdmissionError::Provider(err @ ProviderError::Fatal(_)) = &e
                    {
                        first_fatal = Some((id.clone(), err.clone()));
                    }
                    failures.push((id, e.to_string()));
                }
            }
        }

        if answers.is_empty() {
            return Err(match first_fatal {
                Some((provider, source)) => EvaluateError::Provider { provider, source },
                None => EvaluateError::AllProvidersFailed(failures),
            });
        }

        let excerpt = build_excerpt(&plans[0].0, self.consensus.policy().excerpt_bytes);
        let decision = self
            .consensus
            .resolve_with_progress(
                input.question.content(),
                input.expected_type,
                &answers,
                &excerpt,
                progress,
            )
            .await;

        info!(
            "Decision: '{}' ({}, confidence {:.2})",
            decision.final_answer, decision.selected_source, decision.final_confidence
        );
        progress.on_decision(&decision);
        self.logger.log(&DecisionRecord {
            question: input.question.content().to_string(),
            answer_type: input.expected_type,
            document_fingerprint: plans[0].0.fingerprint.to_string(),
            document_len: input.document.len(),
            decision: decision.clone(),
            failures,
        });

        Ok(decision)
    }

    /// Query every provider concurrently, returning outcomes in provider
    /// order.
    async fn query_providers(
        &self,
        input: &EvaluateInput,
        plans: &[(Arc<ChunkPlan>, usize)],
        progress: &dyn EvaluationProgress,
    ) -> Vec<(String, Result<ModelAnswer, AdmissionError>)> {
        let mut join_set = JoinSet::new();
        let mut branches = HashMap::new();

        for (index, (slot, (plan, budget))) in self.providers.iter().zip(plans).enumerate() {
            let chunks = pack_chunks(plan, *budget);
            let prompt = PromptTemplate::extraction_prompt(
                input.question.content(),
                input.expected_type,
                &chunks,
            );
            let request = Arc::new(
                ProviderRequest::new(&slot.model, prompt)
                    .with_system_prompt(PromptTemplate::extraction_system())
                    .with_max_tokens(self.params.max_answer_tokens)
                    .with_temperature(self.params.temperature),
            );
            let admission = Admission::new(format!("{}: extraction", slot.id))
                .with_estimated_tokens(
                    estimate_tokens(request.prompt.len()) as u64
                        + u64::from(request.max_tokens),
                );
            debug!(
                "Provider {}: sending {} of {} chunks",
                slot.id,
                chunks.len(),
                plan.chunks.len()
            );

            let slot = slot.clone();
            let answer_type = input.expected_type;
            let default_confidence = self.consensus.policy().default_confidence;

            let branch = (index, slot.id.clone());
            let handle = join_set.spawn(async move {
                let provider = slot.provider.clone();
                let result = slot
                    .controller
                    .admit(admission, move || {
                        let provider = provider.clone();
                        let request = request.clone();
                        async move { provider.call(&request).await }
                    })
                    .await
                    .map(|reply| {
                        let parsed = parse_answer_reply(&reply.text);
                        ModelAnswer::new(
                            slot.id.clone(),
                            parsed.answer,
                            parsed.confidence.unwrap_or(default_confidence),
                            answer_type,
                        )
                        .with_tokens_used(reply.tokens_used)
                    });
                (index, slot.id, result)
            });
            branches.insert(handle.id(), branch);
        }

        collect_outcomes(join_set, branches, progress).await
    }
}

type BranchOutcome = (usize, String, Result<ModelAnswer, AdmissionError>);

/// Drain provider branches in completion order and return their outcomes
/// in provider order. A branch whose task panicked or was cancelled is
/// reported as a failure of its provider.
async fn collect_outcomes(
    mut join_set: JoinSet<BranchOutcome>,
    mut branches: HashMap<task::Id, (usize, String)>,
    progress: &dyn EvaluationProgress,
) -> Vec<(String, Result<ModelAnswer, AdmissionError>)> {
    let mut outcomes = Vec::new();
    while let Some(result) = join_set.join_next().await {
        let (index, id, outcome) = match result {
            Ok(branch) => branch,
            Err(e) => {
                let Some((index, id)) = branches.remove(&e.id()) else {
                    warn!("Task join error for an unknown branch: {}", e);
                    continue;
                };
                (index, id, Err(AdmissionError::Aborted(e.to_string())))
            }
        };
        match &outcome {
            Ok(answer) => info!(
                "Provider {} answered '{}' (confidence {:.2})",
                id, answer.normalized_text, answer.confidence
            ),
            Err(e) => warn!("Provider {} failed: {}", id, e),
        }
        progress.on_provider_complete(&id, outcome.is_ok());
        outcomes.push((index, id, outcome));
    }

    outcomes.sort_by_key(|(index, _, _)| *index);
    outcomes
        .into_iter()
        .map(|(_, id, outcome)| (id, outcome))
        .collect()
}

/// Highest-ranked chunks of `plan` whose estimated tokens fit
/// `budget_tokens`, restored to document order.
///
/// The first chunk is always included.
fn pack_chunks(plan: &ChunkPlan, budget_tokens: usize) -> Vec<&DocumentChunk> {
    let mut used = 0usize;
    let mut packed: Vec<&DocumentChunk> = Vec::new();
    for chunk in &plan.chunks {
        if packed.is_empty() || used + chunk.estimated_tokens <= budget_tokens {
            used += chunk.estimated_tokens;
            packed.push(chunk);
        }
    }
    packed.sort_by_key(|c| (c.start_offset, c.end_offset));
    packed
}

/// Grounding excerpt for the arbitrator: the highest-ranked chunks, up to
/// about `max_bytes`.
fn build_excerpt(plan: &ChunkPlan, max_bytes: usize) -> String {
    let mut excerpt = String::new();
    for chunk in &plan.chunks {
        if excerpt.len() >= max_bytes {
            break;
        }
        if !excerpt.is_empty() {
            excerpt.push_str("\n...\n");
        }
        excerpt.push_str(chunk.content.trim());
    }
    excerpt
}
