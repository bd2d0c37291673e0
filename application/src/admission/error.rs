//! Admission failures

use crate::ports::provider::ProviderError;
use std::time::Duration;
use thiserror::Error;

/// Why an admitted operation did not produce a value.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmissionError {
    #[error("Queue is full ({depth} operations waiting)")]
    QueueOverflow { depth: usize },

    #[error("Operation waited {waited:?} in the queue without being dispatched")]
    QueueTimeout { waited: Duration },

    #[error("Circuit is open, retry after {retry_after:?}")]
    CircuitOpen { retry_after: Duration },

    /// The operation ran and failed; carries the error of the last attempt.
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("Admission controller shut down")]
    Shutdown,

    /// The task awaiting the result panicked or was cancelled.
    #[error("Operation aborted: {0}")]
    Aborted(String),
}

impl AdmissionError {
    /// Whether the operation was never invoked.
    pub fn is_rejection(&self) -> bool {
        !matches!(
            self,
            AdmissionError::Provider(_) | AdmissionError::Aborted(_)
        )
    }

    /// Retry-after hint, if the rejection carries one.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            AdmissionError::CircuitOpen { retry_after } => Some(*retry_after),
            _ => None,
        }
    }
}
