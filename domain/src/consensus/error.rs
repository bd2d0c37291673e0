//! Arbitration errors

use thiserror::Error;

/// Why an arbitration produced no usable verdict.
///
/// Always absorbed by the consensus engine, which falls back to the most
/// confident candidate.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArbitrationError {
    #[error("No arbitrator configured")]
    Unavailable,

    #[error("Arbitrator call failed: {0}")]
    CallFailed(String),

    #[error("Arbitrator response has no decision: {0}")]
    Unparseable(String),

    #[error("Arbitrator chose unknown candidate '{0}'")]
    InvalidChoice(String),

    #[error("Arbitrator chose SYNTHESIZED without an answer")]
    MissingSynthesis,
}
