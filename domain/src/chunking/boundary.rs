//! Natural boundary search around a cut offset

use crate::core::string::{ceil_char_boundary, floor_char_boundary};
use regex::Regex;
use std::sync::LazyLock;

static RE_SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[.!?]["')\]]?\s"#).expect("valid sentence end regex"));

static RE_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?:#{1,6}\s+\S|(?:ARTICLE|SECTION|PART|SCHEDULE|EXHIBIT|ENDORSEMENT)\b|\d+(?:\.\d+)*\.?\s+[A-Z]|[A-Z][A-Z0-9 ,&'/-]{3,}:?$)",
    )
    .expect("valid heading regex")
});

/// Class of a natural boundary, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum BoundaryKind {
    /// Blank-line paragraph break
    Paragraph,
    /// Start of a heading line
    Heading,
    /// After sentence-ending punctuation
    Sentence,
}

/// Find a natural cut point near `target`.
///
/// Searches `target ± window` (never at or before `floor`) and returns the
/// candidate of the best [`BoundaryKind`], nearest to `target` within that
/// class. Cut offsets are exclusive ends: `text[..cut]` ends right after the
/// boundary. Returns `None` when the window holds no boundary.
pub fn find_boundary(
    text: &str,
    target: usize,
    window: usize,
    floor: usize,
) -> Option<(usize, BoundaryKind)> {
    let lo = floor_char_boundary(text, target.saturating_sub(window).max(floor));
    let hi = ceil_char_boundary(text, target.saturating_add(window));
    if lo >= hi {
        return None;
    }
    let region = &text[lo..hi];

    let mut best: Option<(usize, BoundaryKind)> = None;
    let mut consider = |cut: usize, kind: BoundaryKind| {
        if cut <= floor || cut > text.len() {
            return;
        }
        let better = match best {
            None => true,
            Some((best_cut, best_kind)) => {
                kind < best_kind
                    || (kind == best_kind && cut.abs_diff(target) < best_cut.abs_diff(target))
            }
        };
        if better {
            best = Some((cut, kind));
        }
    };

    for (idx, _) in region.match_indices("\n\n") {
        consider(lo + idx + 2, BoundaryKind::Paragraph);
    }

    for (idx, _) in region.match_indices('\n') {
        let line_start = lo + idx + 1;
        let line_end = text[line_start..]
            .find('\n')
            .map_or(text.len(), |n| line_start + n);
        let line = text[line_start..line_end].trim();
        if !line.is_empty() && RE_HEADING.is_match(line) {
            consider(line_start, BoundaryKind::Heading);
        }
    }

    for m in RE_SENTENCE_END.find_iter(region) {
        consider(lo + m.end(), BoundaryKind::Sentence);
    }

    best
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefers_paragraph_over_sentence() {
        let text = "First sentence. Second sentence.\n\nNew paragraph starts here.";
        let target = 20;
        let (cut, kind) = find_boundary(text, target, 30, 0).unwrap();
        assert_eq!(kind, BoundaryKind::Paragraph);
        assert_eq!(&text[cut..cut + 3], "New");
    }

    #[test]
    fn test_sentence_boundary_nearest_target() {
        let text = "Alpha one. Beta two. Gamma three. Delta four.";
        let (cut, kind) = find_boundary(text, 22, 10, 0).unwrap();
        assert_eq!(kind, BoundaryKind::Sentence);
        assert_eq!(&text[cut..cut + 5], "Gamma");
    }

    #[test]
    fn test_heading_boundary() {
        let text = "some words without punctuation\nSECTION 4 COVERAGE\nmore words here";
        let (cut, kind) = find_boundary(text, 28, 10, 0).unwrap();
        assert_eq!(kind, BoundaryKind::Heading);
        assert!(text[cut..].starts_with("SECTION 4"));
    }

    #[test]
    fn test_no_boundary_in_window() {
        let text = "abcdefghijklmnopqrstuvwxyz".repeat(4);
        assert_eq!(find_boundary(&text, 50, 10, 0), None);
    }

    #[test]
    fn test_never_cuts_at_or_before_floor() {
        let text = "One. Two. Three. Four.";
        let result = find_boundary(text, 5, 5, 9);
        if let Some((cut, _)) = result {
            assert!(cut > 9);
        }
    }

    #[test]
    fn test_multibyte_window_edges() {
        let text = "Prix: 12 €. Montant dû: 40 €. Fin.";
        // Window edges land inside multi-byte characters; must not panic
        for target in 0..text.len() {
            let _ = find_boundary(text, target, 3, 0);
        }
    }
}
