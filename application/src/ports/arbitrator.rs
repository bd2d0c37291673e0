//! Arbitrator port
//!
//! Breaks disagreements between candidate answers.

use async_trait::async_trait;
use docquorum_domain::{ArbitrationError, ArbitrationRequest, ArbitrationVerdict};

/// Independent evaluator consulted when answers disagree
///
/// Failures are absorbed by the consensus engine, never surfaced.
#[async_trait]
pub trait Arbitrator: Send + Sync {
    /// Identifier used in logs
    fn id(&self) -> &str;

    async fn arbitrate(
        &self,
        request: &ArbitrationRequest,
    ) -> Result<ArbitrationVerdict, ArbitrationError>;
}
