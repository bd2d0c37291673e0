//! Chunk value objects

use serde::{Deserialize, Serialize};

/// Rough bytes-per-token ratio used for budget estimates.
pub const BYTES_PER_TOKEN: usize = 4;

/// Estimated token count for `bytes` of text.
pub fn estimate_tokens(bytes: usize) -> usize {
    bytes.div_ceil(BYTES_PER_TOKEN)
}

/// Evaluation priority of a chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkPriority {
    Critical,
    High,
    Medium,
    Low,
}

impl ChunkPriority {
    /// Numeric rank, higher is more important.
    pub fn rank(&self) -> u8 {
        match self {
            ChunkPriority::Critical => 3,
            ChunkPriority::High => 2,
            ChunkPriority::Medium => 1,
            ChunkPriority::Low => 0,
        }
    }

    /// Priority for a regular chunk's relevance score.
    pub fn from_score(score: f64) -> Self {
        if score >= 10.0 {
            ChunkPriority::High
        } else if score >= 4.0 {
            ChunkPriority::Medium
        } else {
            ChunkPriority::Low
        }
    }
}

/// Structural role of a chunk in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    Header,
    Content,
    Footer,
    Table,
    Summary,
}

/// Content features detected in a chunk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkTags {
    pub has_table: bool,
    pub has_numbers: bool,
    pub has_dates: bool,
    pub has_legal_terms: bool,
}

/// Half-open byte range `[start, end)` in the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

impl ChunkSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `other` lies entirely inside this span.
    pub fn contains(&self, other: &ChunkSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// A bounded contiguous span of a document, ready for evaluation.
///
/// Produced by the chunking engine and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub size_bytes: usize,
    pub estimated_tokens: usize,
    pub priority: ChunkPriority,
    pub tags: ChunkTags,
    pub kind: ChunkKind,
    /// Relevance score the priority was derived from
    pub score: f64,
}

impl DocumentChunk {
    pub fn span(&self) -> ChunkSpan {
        ChunkSpan::new(self.start_offset, self.end_offset)
    }

    pub fn is_critical(&self) -> bool {
        self.priority == ChunkPriority::Critical
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_tokens_rounds_up() {
        assert_eq!(estimate_tokens(0), 0);
        assert_eq!(estimate_tokens(1), 1);
        assert_eq!(estimate_tokens(8), 2);
        assert_eq!(estimate_tokens(9), 3);
    }

    #[test]
    fn test_priority_from_score() {
        assert_eq!(ChunkPriority::from_score(12.0), ChunkPriority::High);
        assert_eq!(ChunkPriority::from_score(4.0), ChunkPriority::Medium);
        assert_eq!(ChunkPriority::from_score(0.5), ChunkPriority::Low);
        assert!(ChunkPriority::Critical.rank() > ChunkPriority::High.rank());
    }

    #[test]
    fn test_span_contains() {
        let outer = ChunkSpan::new(10, 50);
        assert!(outer.contains(&ChunkSpan::new(10, 50)));
        assert!(outer.contains(&ChunkSpan::new(20, 30)));
        assert!(!outer.contains(&ChunkSpan::new(5, 30)));
        assert!(!outer.contains(&ChunkSpan::new(40, 51)));
        assert_eq!(outer.len(), 40);
    }
}
