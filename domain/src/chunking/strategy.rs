//! Chunking strategies and document size bands

use super::chunk::BYTES_PER_TOKEN;
use serde::{Deserialize, Serialize};

/// Named chunking strategy, one per size band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Whole document as a single chunk
    None,
    Smart,
    Aggressive,
    Semantic,
    Emergency,
}

impl StrategyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::None => "none",
            StrategyKind::Smart => "smart",
            StrategyKind::Aggressive => "aggressive",
            StrategyKind::Semantic => "semantic",
            StrategyKind::Emergency => "emergency",
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decision record for how a document is sliced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkingStrategy {
    pub kind: StrategyKind,
    /// Target size of a regular chunk in bytes
    pub max_chunk_size: usize,
    /// Bytes shared between consecutive regular chunks
    pub overlap_size: usize,
    /// Ceiling on chunks returned for one document
    pub max_chunk_count: usize,
}

impl ChunkingStrategy {
    pub fn new(
        kind: StrategyKind,
        max_chunk_size: usize,
        overlap_size: usize,
        max_chunk_count: usize,
    ) -> Self {
        Self {
            kind,
            max_chunk_size,
            overlap_size,
            max_chunk_count,
        }
    }

    /// The whole document as one chunk.
    pub fn whole(document_len: usize) -> Self {
        Self::new(StrategyKind::None, document_len, 0, 1)
    }

    /// Shrink this strategy so a single chunk fits `budget_tokens`.
    ///
    /// Overlap is kept below a quarter of the resulting chunk size.
    pub fn fitted_to_budget(self, budget_tokens: usize) -> Self {
        let budget_bytes = budget_tokens.saturating_mul(BYTES_PER_TOKEN).max(1);
        let max_chunk_size = self.max_chunk_size.min(budget_bytes).max(1);
        Self {
            max_chunk_size,
            overlap_size: self.overlap_size.min(max_chunk_size / 4),
            ..self
        }
    }
}

/// One size band: documents shorter than `below_bytes` use `strategy`.
///
/// The last band has no upper bound.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBand {
    pub below_bytes: Option<usize>,
    pub strategy: ChunkingStrategy,
}

/// Ordered size bands, smallest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeBands {
    bands: Vec<SizeBand>,
}

impl Default for SizeBands {
    fn default() -> Self {
        Self {
            bands: vec![
                SizeBand {
                    below_bytes: Some(50_000),
                    strategy: ChunkingStrategy::new(StrategyKind::None, 50_000, 0, 1),
                },
                SizeBand {
                    below_bytes: Some(200_000),
                    strategy: ChunkingStrategy::new(StrategyKind::Smart, 40_000, 1_000, 12),
                },
                SizeBand {
                    below_bytes: Some(800_000),
                    strategy: ChunkingStrategy::new(StrategyKind::Aggressive, 30_000, 500, 20),
                },
                SizeBand {
                    below_bytes: Some(3_000_000),
                    strategy: ChunkingStrategy::new(StrategyKind::Semantic, 25_000, 750, 30),
                },
                SizeBand {
                    below_bytes: None,
                    strategy: ChunkingStrategy::new(StrategyKind::Emergency, 20_000, 200, 40),
                },
            ],
        }
    }
}

impl SizeBands {
    pub fn new(bands: Vec<SizeBand>) -> Self {
        Self { bands }
    }

    pub fn bands(&self) -> &[SizeBand] {
        &self.bands
    }

    /// Pick the strategy for a document of `document_len` bytes.
    pub fn select(&self, document_len: usize) -> ChunkingStrategy {
        self.bands
            .iter()
            .find(|band| band.below_bytes.is_none_or(|limit| document_len < limit))
            .or_else(|| self.bands.last())
            .map(|band| band.strategy)
            .unwrap_or_else(|| ChunkingStrategy::whole(document_len))
    }

    /// First chunked band, used when an unchunked document overflows the budget.
    pub fn first_chunked(&self) -> Option<ChunkingStrategy> {
        self.bands
            .iter()
            .map(|band| band.strategy)
            .find(|s| s.kind != StrategyKind::None)
    }

    /// Validate band ordering and per-strategy sizes.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        if self.bands.is_empty() {
            issues.push("chunking: at least one size band is required".to_string());
            return issues;
        }
        if self.bands.last().is_some_and(|b| b.below_bytes.is_some()) {
            issues.push("chunking: the last size band must have no upper bound".to_string());
        }
        let bounds: Vec<usize> = self.bands.iter().filter_map(|b| b.below_bytes).collect();
        if bounds.windows(2).any(|w| w[0] >= w[1]) {
            issues.push("chunking: size bands must be in ascending order".to_string());
        }
        for band in &self.bands {
            let s = &band.strategy;
            if s.kind == StrategyKind::None {
                continue;
            }
            if s.max_chunk_size == 0 || s.max_chunk_count == 0 {
                issues.push(format!(
                    "chunking: {} band needs max_chunk_size and max_chunk_count >= 1",
                    s.kind
                ));
            }
            if s.overlap_size >= s.max_chunk_size {
                issues.push(format!(
                    "chunking: {} band overlap ({}) must be smaller than max_chunk_size ({})",
                    s.kind, s.overlap_size, s.max_chunk_size
                ));
            }
        }
        issues
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_band_selection() {
        let bands = SizeBands::default();
        assert_eq!(bands.select(0).kind, StrategyKind::None);
        assert_eq!(bands.select(49_999).kind, StrategyKind::None);
        assert_eq!(bands.select(50_000).kind, StrategyKind::Smart);
        assert_eq!(bands.select(500_000).kind, StrategyKind::Aggressive);
        assert_eq!(bands.select(1_000_000).kind, StrategyKind::Semantic);
        assert_eq!(bands.select(50_000_000).kind, StrategyKind::Emergency);
    }

    #[test]
    fn test_default_bands_valid() {
        assert!(SizeBands::default().validate().is_empty());
    }

    #[test]
    fn test_fitted_to_budget() {
        let s = ChunkingStrategy::new(StrategyKind::Smart, 40_000, 1_000, 12);
        let fitted = s.fitted_to_budget(1_000);
        assert_eq!(fitted.max_chunk_size, 4_000);
        assert_eq!(fitted.overlap_size, 1_000);

        let tight = s.fitted_to_budget(100);
        assert_eq!(tight.max_chunk_size, 400);
        assert_eq!(tight.overlap_size, 100);
    }

    #[test]
    fn test_validate_catches_bad_bands() {
        let bands = SizeBands::new(vec![
            SizeBand {
                below_bytes: Some(100),
                strategy: ChunkingStrategy::new(StrategyKind::Smart, 10, 10, 3),
            },
            SizeBand {
                below_bytes: Some(50),
                strategy: ChunkingStrategy::new(StrategyKind::Emergency, 10, 2, 3),
            },
        ]);
        let issues = bands.validate();
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_first_chunked() {
        let bands = SizeBands::default();
        assert_eq!(bands.first_chunked().map(|s| s.kind), Some(StrategyKind::Smart));
    }
}
