//! Domain layer for docquorum
//!
//! This crate contains the core business logic, entities, and value objects.
//! It has no dependencies on infrastructure or presentation concerns, and
//! never reads the clock or performs I/O.
//!
//! # Core Concepts
//!
//! ## Admission
//!
//! Bookkeeping for per-provider admission control: priorities, the
//! trailing-minute [`RateWindow`], the [`CircuitState`] breaker and the
//! [`RetryPolicy`] backoff schedule.
//!
//! ## Chunking
//!
//! The [`ChunkingEngine`] splits a document that does not fit a provider's
//! context budget into boundary-aware, prioritized chunks.
//!
//! ## Consensus
//!
//! Independently obtained [`ModelAnswer`]s are normalized per
//! [`AnswerType`], compared by continuous agreement and settled into a
//! [`ConsensusDecision`], with an arbitrator breaking disagreements.

pub mod admission;
pub mod chunking;
pub mod config;
pub mod consensus;
pub mod core;
pub mod prompt;

// Re-export commonly used types
pub use admission::{AdmissionPolicy, CircuitPolicy, CircuitState, Priority, RateWindow, RetryPolicy};
pub use chunking::{
    ChunkKind, ChunkPlan, ChunkPriority, ChunkSpan, ChunkingEngine, ChunkingError,
    ChunkingOptions, ChunkingStrategy, DocumentChunk, Fingerprint, SizeBand, SizeBands,
    StrategyKind,
};
pub use config::{ConfigIssue, ConfigIssueCode, OutputFormat, Severity};
pub use consensus::{
    AnswerType, ArbitrationChoice, ArbitrationError, ArbitrationRequest, ArbitrationVerdict,
    ConsensusDecision, ConsensusPolicy, ModelAnswer, ResolutionPhase, SelectedSource,
};
pub use core::{error::DomainError, model::ModelClass, question::Question};
pub use prompt::PromptTemplate;
