//! Application layer for docquorum
//!
//! This crate contains use cases, port definitions, and the stateful
//! services built around the pure domain: per-provider admission control,
//! cached chunking and arbitrated consensus. It depends only on the domain
//! layer.

pub mod admission;
pub mod chunking;
pub mod config;
pub mod consensus;
pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use admission::{Admission, AdmissionController, AdmissionError, AdmissionStats, AdmissionTicket};
pub use chunking::ChunkingService;
pub use config::ExecutionParams;
pub use consensus::{ConsensusEngine, ProviderArbitrator};
pub use ports::{
    arbitrator::Arbitrator,
    decision_logger::{DecisionLogger, DecisionRecord, NoDecisionLogger},
    progress::{EvaluationProgress, NoProgress},
    provider::{Provider, ProviderError, ProviderReply, ProviderRequest},
};
pub use use_cases::evaluate::{
    EvaluateDocumentUseCase, EvaluateError, EvaluateInput, EvaluationMode, ProviderSlot,
};
