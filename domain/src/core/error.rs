//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Invalid question: {0}")]
    InvalidQuestion(String),

    #[error("Invalid answer type: {0}")]
    InvalidAnswerType(String),

    #[error("Invalid priority: {0}")]
    InvalidPriority(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid resolution phase transition: {from} -> {to}")]
    InvalidPhaseTransition { from: String, to: String },
}
