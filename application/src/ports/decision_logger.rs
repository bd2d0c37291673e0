//! Port for structured decision logging.
//!
//! Defines the [`DecisionLogger`] trait for recording every consensus
//! decision to a machine-readable audit log (JSONL).
//!
//! This is separate from `tracing`-based operation logs: tracing handles
//! human-readable diagnostic messages, while this port captures what was
//! asked, what each provider answered and how the answer was settled.

use docquorum_domain::{AnswerType, ConsensusDecision};

/// One logged evaluation.
#[derive(Debug, Clone)]
pub struct DecisionRecord {
    pub question: String,
    pub answer_type: AnswerType,
    /// Document content fingerprint
    pub document_fingerprint: String,
    pub document_len: usize,
    pub decision: ConsensusDecision,
    /// Providers whose call failed, with the error text
    pub failures: Vec<(String, String)>,
}

/// Port for logging decisions to a structured log.
///
/// The `log` method is intentionally synchronous and non-fallible to avoid
/// disrupting the evaluation; logging failures are ignored.
pub trait DecisionLogger: Send + Sync {
    /// Record a decision.
    fn log(&self, record: &DecisionRecord);
}

/// No-op implementation for tests and when logging is disabled.
pub struct NoDecisionLogger;

impl DecisionLogger for NoDecisionLogger {
    fn log(&self, _record: &DecisionRecord) {}
}
