//! Critical-section detection

use super::chunk::ChunkSpan;
use crate::core::string::{ceil_char_boundary, floor_char_boundary};
use regex::Regex;
use std::sync::LazyLock;

static RE_CRITICAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b(?:limits? of liability|policy period|effective date|named insured|coverages?|limits?|premiums?|deductibles?|exclusions?|claims?|insured)\b",
    )
    .expect("valid critical section regex")
});

/// Spans around every domain-critical term, in document order.
///
/// Each match is widened by `context` bytes on both sides and snapped to
/// character boundaries. Overlapping spans are kept; callers dedupe by
/// containment against chunks they already selected.
pub fn find_critical_sections(text: &str, context: usize) -> Vec<ChunkSpan> {
    RE_CRITICAL
        .find_iter(text)
        .map(|m| {
            let start = floor_char_boundary(text, m.start().saturating_sub(context));
            let end = ceil_char_boundary(text, m.end().saturating_add(context));
            ChunkSpan::new(start, end)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_finds_terms_case_insensitively() {
        let text = "Intro text. The PREMIUM is due monthly. Nothing else. Claims go here.";
        let spans = find_critical_sections(text, 0);
        let terms: Vec<&str> = spans.iter().map(|s| &text[s.start..s.end]).collect();
        assert_eq!(terms, vec!["PREMIUM", "Claims"]);
    }

    #[test]
    fn test_multiword_terms_win() {
        let text = "The limit of liability is $1,000,000.";
        let spans = find_critical_sections(text, 0);
        assert_eq!(&text[spans[0].start..spans[0].end], "limit of liability");
    }

    #[test]
    fn test_context_is_clamped() {
        let text = "premium";
        let spans = find_critical_sections(text, 100);
        assert_eq!(spans, vec![ChunkSpan::new(0, text.len())]);
    }

    #[test]
    fn test_no_partial_word_matches() {
        assert!(find_critical_sections("reclaimed uninsuredness", 5).is_empty());
    }
}
