//! Relevance scoring for regular chunks

use super::chunk::ChunkTags;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RE_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d").expect("valid number regex"));

static RE_DATE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:\d{1,2}[/-]\d{1,2}[/-]\d{2,4}|\d{4}-\d{2}-\d{2}|(?:jan|feb|mar|apr|may|jun|jul|aug|sep|sept|oct|nov|dec)[a-z]*\.?\s+\d{1,2},?\s+\d{4})\b",
    )
    .expect("valid date regex")
});

static RE_LEGAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:hereby|whereas|pursuant|herein|thereof|indemnif\w*|liabilit\w*|warrant\w*|shall)\b")
        .expect("valid legal term regex")
});

static RE_COLUMN_GAP: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S {3,}\S").expect("valid column gap regex"));

/// Weights of the relevance score components.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    /// Per keyword occurrence
    pub keyword: f64,
    /// First or last chunk of the document
    pub edge_position: f64,
    pub numbers: f64,
    pub dates: f64,
    pub table: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            keyword: 2.0,
            edge_position: 5.0,
            numbers: 1.0,
            dates: 1.0,
            table: 2.0,
        }
    }
}

/// Detect content features of a chunk.
pub fn detect_tags(content: &str) -> ChunkTags {
    ChunkTags {
        has_table: looks_like_table(content),
        has_numbers: RE_NUMBER.is_match(content),
        has_dates: RE_DATE.is_match(content),
        has_legal_terms: RE_LEGAL.is_match(content),
    }
}

/// Two or more lines laid out in columns (pipes, tabs or wide space gaps).
fn looks_like_table(content: &str) -> bool {
    content
        .lines()
        .filter(|line| {
            line.matches('|').count() >= 2
                || line.matches('\t').count() >= 2
                || RE_COLUMN_GAP.find_iter(line).count() >= 2
        })
        .nth(1)
        .is_some()
}

/// Relevance score of a chunk for the given question keywords.
///
/// `keywords` must already be lower-cased. `at_edge` marks the first or last
/// chunk of the document, where identifying and signature content clusters.
pub fn score_chunk(
    content: &str,
    keywords: &[String],
    tags: &ChunkTags,
    at_edge: bool,
    weights: &ScoreWeights,
) -> f64 {
    let lowered = content.to_lowercase();
    let matches: usize = keywords
        .iter()
        .map(|k| lowered.matches(k.as_str()).count())
        .sum();

    let mut score = matches as f64 * weights.keyword;
    if at_edge {
        score += weights.edge_position;
    }
    if tags.has_numbers {
        score += weights.numbers;
    }
    if tags.has_dates {
        score += weights.dates;
    }
    if tags.has_table {
        score += weights.table;
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keywords(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn test_detect_tags() {
        let tags = detect_tags("The insurer shall pay by 01/15/2024 the sum of 500.");
        assert!(tags.has_numbers);
        assert!(tags.has_dates);
        assert!(tags.has_legal_terms);
        assert!(!tags.has_table);
    }

    #[test]
    fn test_detect_table() {
        let table = "| Item | Limit |\n| Fire | 100 |\n";
        assert!(detect_tags(table).has_table);
        let columns = "Building    500,000    1,000\nContents    50,000     500\n";
        assert!(detect_tags(columns).has_table);
        assert!(!detect_tags("a | b\nplain line").has_table);
    }

    #[test]
    fn test_month_name_dates() {
        assert!(detect_tags("Effective March 3, 2023 at noon").has_dates);
    }

    #[test]
    fn test_keyword_score() {
        let tags = ChunkTags::default();
        let score = score_chunk(
            "Deductible applies. The deductible is waived for glass.",
            &keywords(&["deductible", "glass"]),
            &tags,
            false,
            &ScoreWeights::default(),
        );
        assert_eq!(score, 6.0);
    }

    #[test]
    fn test_bonus_components() {
        let tags = ChunkTags {
            has_table: true,
            has_numbers: true,
            has_dates: true,
            has_legal_terms: true,
        };
        let score = score_chunk("", &[], &tags, true, &ScoreWeights::default());
        assert_eq!(score, 5.0 + 1.0 + 1.0 + 2.0);
    }
}
