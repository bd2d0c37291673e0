//! Chunking configuration from TOML (`[chunking]` section)

use docquorum_domain::chunking::ScoreWeights;
use docquorum_domain::{
    ChunkingOptions, ChunkingStrategy, ConfigIssue, ConfigIssueCode, SizeBand, SizeBands,
    StrategyKind, config::issues_from_messages,
};
use serde::{Deserialize, Serialize};

/// One `[[chunking.bands]]` entry.
///
/// A band without `below_bytes` is unbounded and must come last.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSizeBand {
    #[serde(default)]
    pub below_bytes: Option<usize>,
    pub strategy: StrategyKind,
    pub max_chunk_size: usize,
    #[serde(default)]
    pub overlap_size: usize,
    pub max_chunk_count: usize,
}

/// Chunking configuration from TOML.
///
/// # Example
///
/// ```toml
/// [chunking]
/// cache_capacity = 16
///
/// [[chunking.bands]]
/// below_bytes = 60000
/// strategy = "none"
/// max_chunk_size = 60000
/// max_chunk_count = 1
///
/// [[chunking.bands]]
/// strategy = "smart"
/// max_chunk_size = 30000
/// overlap_size = 500
/// max_chunk_count = 20
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChunkingConfig {
    /// Size bands, smallest first (empty = built-in bands)
    pub bands: Vec<FileSizeBand>,
    /// Chunk plans kept in the LRU cache
    pub cache_capacity: usize,
    /// Bytes of context around each critical term
    pub critical_context: usize,
    pub small_context_limit_bytes: usize,
    pub weights: ScoreWeights,
}

impl Default for FileChunkingConfig {
    fn default() -> Self {
        let options = ChunkingOptions::default();
        Self {
            bands: Vec::new(),
            cache_capacity: 64,
            critical_context: options.critical_context,
            small_context_limit_bytes: options.small_context_limit_bytes,
            weights: options.weights,
        }
    }
}

impl FileChunkingConfig {
    /// Convert to domain `ChunkingOptions`, returning validation issues.
    ///
    /// Invalid bands fall back to the built-in bands.
    pub fn to_options(&self) -> (ChunkingOptions, Vec<ConfigIssue>) {
        let mut issues = Vec::new();

        let bands = if self.bands.is_empty() {
            SizeBands::default()
        } else {
            let bands = SizeBands::new(
                self.bands
                    .iter()
                    .map(|b| SizeBand {
                        below_bytes: b.below_bytes,
                        strategy: ChunkingStrategy::new(
                            b.strategy,
                            b.max_chunk_size,
                            b.overlap_size,
                            b.max_chunk_count,
                        ),
                    })
                    .collect(),
            );
            let problems = bands.validate();
            if problems.is_empty() {
                bands
            } else {
                issues.extend(issues_from_messages(
                    ConfigIssueCode::InvalidChunking,
                    problems,
                ));
                SizeBands::default()
            }
        };

        if self.cache_capacity == 0 {
            issues.push(ConfigIssue::error(
                ConfigIssueCode::InvalidChunking,
                "chunking: cache_capacity must be >= 1",
            ));
        }

        let options = ChunkingOptions {
            bands,
            critical_context: self.critical_context,
            small_context_limit_bytes: self.small_context_limit_bytes,
            weights: self.weights,
        };
        (options, issues)
    }
}
