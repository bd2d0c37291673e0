//! Chunking errors

use thiserror::Error;

/// Chunking fails atomically: no partial chunk set is ever returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChunkingError {
    #[error("Document is empty")]
    EmptyDocument,

    #[error("Document is not valid UTF-8 (first invalid byte at offset {offset})")]
    InvalidEncoding { offset: usize },

    #[error("Context budget must be greater than zero")]
    InvalidBudget,

    #[error("Chunk plan leaves bytes {start}..{end} uncovered")]
    CoverageGap { start: usize, end: usize },
}
