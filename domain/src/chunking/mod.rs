//! Adaptive document chunking
//!
//! Splits an oversized document into prioritized, boundary-aware chunks that
//! fit a provider's context budget.
//!
//! ```text
//! document ──► strategy (size band) ──► regular slicing (boundary-aware, overlapped)
//!                                      │
//!                                      ├──► relevance scoring ──► priority
//!                                      └──► critical-section extraction
//!                                                   │
//!                                  selection (max_chunk_count) ──► ChunkPlan
//! ```
//!
//! The engine is pure: it never caches and never performs I/O. Caching by
//! content [`Fingerprint`] lives in the application layer.

pub mod boundary;
pub mod chunk;
pub mod critical;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod scoring;
pub mod strategy;

pub use boundary::{BoundaryKind, find_boundary};
pub use chunk::{ChunkKind, ChunkPriority, ChunkSpan, ChunkTags, DocumentChunk, estimate_tokens};
pub use critical::find_critical_sections;
pub use engine::{ChunkPlan, ChunkingEngine, ChunkingOptions};
pub use error::ChunkingError;
pub use fingerprint::Fingerprint;
pub use scoring::{ScoreWeights, score_chunk};
pub use strategy::{ChunkingStrategy, SizeBand, SizeBands, StrategyKind};
