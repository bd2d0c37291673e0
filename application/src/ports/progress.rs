//! Progress notification port
//!
//! Defines the interface for reporting progress during an evaluation.

use docquorum_domain::{ChunkPlan, ConsensusDecision, ResolutionPhase};

/// Callback for progress updates during an evaluation
///
/// Implementations live in the presentation layer and can display
/// progress in various ways (progress bars, plain logs, etc.)
pub trait EvaluationProgress: Send + Sync {
    /// Called once the provider calls are about to start
    fn on_evaluation_start(&self, providers: &[String]);

    /// Called when a provider's document has been chunked
    fn on_chunked(&self, _provider: &str, _plan: &ChunkPlan) {}

    /// Called when a provider call completes
    fn on_provider_complete(&self, provider: &str, success: bool);

    /// Called on each resolution phase change
    fn on_phase(&self, _phase: ResolutionPhase) {}

    /// Called with the final decision
    fn on_decision(&self, decision: &ConsensusDecision);
}

/// No-op progress notifier for when progress reporting is not needed
pub struct NoProgress;

impl EvaluationProgress for NoProgress {
    fn on_evaluation_start(&self, _providers: &[String]) {}
    fn on_provider_complete(&self, _provider: &str, _success: bool) {}
    fn on_decision(&self, _decision: &ConsensusDecision) {}
}
