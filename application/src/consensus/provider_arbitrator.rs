//! Arbitrator backed by a model provider

use crate::admission::{Admission, AdmissionController};
use crate::config::ExecutionParams;
use crate::ports::arbitrator::Arbitrator;
use crate::ports::provider::{Provider, ProviderRequest};
use async_trait::async_trait;
use docquorum_domain::chunking::estimate_tokens;
use docquorum_domain::consensus::parse_verdict;
use docquorum_domain::{
    ArbitrationError, ArbitrationRequest, ArbitrationVerdict, ConsensusPolicy, Priority,
    PromptTemplate,
};
use std::sync::Arc;
use tracing::debug;

/// Asks a provider, through its own admission controller, to pick between
/// candidate answers.
pub struct ProviderArbitrator {
    provider: Arc<dyn Provider>,
    controller: Arc<AdmissionController>,
    model: String,
    params: ExecutionParams,
    policy: ConsensusPolicy,
}

impl ProviderArbitrator {
    pub fn new(
        provider: Arc<dyn Provider>,
        controller: Arc<AdmissionController>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            controller,
            model: model.into(),
            params: ExecutionParams::default(),
            policy: ConsensusPolicy::default(),
        }
    }

    pub fn with_params(mut self, params: ExecutionParams) -> Self {
        self.params = params;
        self
    }

    /// Policy whose thresholds label the disagreement in the prompt.
    pub fn with_policy(mut self, policy: ConsensusPolicy) -> Self {
        self.policy = policy;
        self
    }

    fn build_request(&self, request: &ArbitrationRequest) -> ProviderRequest {
        let prompt = PromptTemplate::arbitration_prompt(
            &request.question,
            request.answer_type,
            &request.candidates,
            &request.excerpt,
            self.policy.disagreement_label(request.agreement),
        );
        ProviderRequest::new(&self.model, prompt)
            .with_system_prompt(PromptTemplate::arbitration_system())
            .with_max_tokens(self.params.max_answer_tokens)
            .with_temperature(self.params.temperature)
    }
}

#[async_trait]
impl Arbitrator for ProviderArbitrator {
    fn id(&self) -> &str {
        self.provider.id()
    }

    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationVerdict, ArbitrationError> {
        let provider_request = Arc::new(self.build_request(request));
        let estimated = estimate_tokens(provider_request.prompt.len()) as u64
            + u64::from(provider_request.max_tokens);

        let provider = self.provider.clone();
        let reply = self
            .controller
            .admit(
                Admission::new(format!("{}: arbitration", self.provider.id()))
                    .with_priority(Priority::High)
                    .with_estimated_tokens(estimated),
                move || {
                    let provider = provider.clone();
                    let provider_request = provider_request.clone();
                    async move { provider.call(&provider_request).await }
                },
            )
            .await
            .map_err(|e| ArbitrationError::CallFailed(e.to_string()))?;

        debug!(
            "Arbitrator {} replied with {} bytes",
            self.provider.id(),
            reply.text.len()
        );
        parse_verdict(&reply.text, request.candidates.len())
    }
}
