//! Chunking engine: strategy selection, slicing, scoring and selection.

use super::boundary::find_boundary;
use super::chunk::{ChunkKind, ChunkPriority, ChunkSpan, DocumentChunk, estimate_tokens};
use super::critical::find_critical_sections;
use super::error::ChunkingError;
use super::fingerprint::Fingerprint;
use super::scoring::{ScoreWeights, detect_tags, score_chunk};
use super::strategy::{ChunkingStrategy, SizeBands, StrategyKind};
use crate::core::model::ModelClass;
use crate::core::question::Question;
use crate::core::string::{ceil_char_boundary, floor_char_boundary};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

static RE_SUMMARY_HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:#{1,6}\s*)?(?:summary|declarations?|overview|schedule of coverages?)\b")
        .expect("valid summary heading regex")
});

/// Bounds of the boundary search window in bytes.
const MIN_BOUNDARY_WINDOW: usize = 64;
const MAX_BOUNDARY_WINDOW: usize = 2_000;

/// Tunables of the chunking engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkingOptions {
    pub bands: SizeBands,
    /// Bytes of context kept on each side of a critical term
    pub critical_context: usize,
    /// Selected content above this size recommends a large-context model
    pub small_context_limit_bytes: usize,
    pub weights: ScoreWeights,
}

impl Default for ChunkingOptions {
    fn default() -> Self {
        Self {
            bands: SizeBands::default(),
            critical_context: 400,
            small_context_limit_bytes: 100_000,
            weights: ScoreWeights::default(),
        }
    }
}

/// Result of chunking one document.
///
/// `chunks` are ordered for evaluation: critical chunks in document order,
/// then regular chunks by descending score. `omitted` holds the spans of
/// regular chunks dropped by the strategy's chunk-count ceiling, so regular
/// chunks plus omitted spans always cover the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkPlan {
    pub chunks: Vec<DocumentChunk>,
    pub omitted: Vec<ChunkSpan>,
    pub strategy: ChunkingStrategy,
    pub recommended_model: ModelClass,
    pub document_len: usize,
    pub fingerprint: Fingerprint,
}

impl ChunkPlan {
    /// Total bytes of selected chunk content.
    pub fn total_bytes(&self) -> usize {
        self.chunks.iter().map(|c| c.size_bytes).sum()
    }

    /// Total estimated tokens of selected chunk content.
    pub fn total_tokens(&self) -> usize {
        self.chunks.iter().map(|c| c.estimated_tokens).sum()
    }

    pub fn regular_chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.chunks.iter().filter(|c| !c.is_critical())
    }

    pub fn critical_chunks(&self) -> impl Iterator<Item = &DocumentChunk> {
        self.chunks.iter().filter(|c| c.is_critical())
    }

    /// Whether every regular chunk was kept.
    pub fn is_complete(&self) -> bool {
        self.omitted.is_empty()
    }

    /// First byte range of the document covered by neither a regular chunk
    /// nor an omitted span.
    pub fn first_gap(&self) -> Option<ChunkSpan> {
        let mut spans: Vec<ChunkSpan> = self
            .regular_chunks()
            .map(|c| c.span())
            .chain(self.omitted.iter().copied())
            .collect();
        spans.sort();

        let mut covered = 0;
        for span in spans {
            if span.start > covered {
                return Some(ChunkSpan::new(covered, span.start));
            }
            covered = covered.max(span.end);
        }
        (covered < self.document_len).then(|| ChunkSpan::new(covered, self.document_len))
    }
}

/// Pure chunking engine.
#[derive(Debug, Clone, Default)]
pub struct ChunkingEngine {
    options: ChunkingOptions,
}

impl ChunkingEngine {
    pub fn new(options: ChunkingOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &ChunkingOptions {
        &self.options
    }

    /// Choose the strategy for a document of `document_len` bytes that must
    /// fit chunks of at most `budget_tokens` tokens.
    pub fn select_strategy(&self, document_len: usize, budget_tokens: usize) -> ChunkingStrategy {
        let selected = self.options.bands.select(document_len);
        if selected.kind != StrategyKind::None {
            return selected.fitted_to_budget(budget_tokens);
        }
        if estimate_tokens(document_len) <= budget_tokens {
            return ChunkingStrategy::whole(document_len);
        }
        self.options
            .bands
            .first_chunked()
            .unwrap_or_else(|| {
                ChunkingStrategy::new(StrategyKind::Smart, document_len, 0, usize::MAX)
            })
            .fitted_to_budget(budget_tokens)
    }

    /// Split `document` into a prioritized chunk plan.
    pub fn plan(
        &self,
        document: &str,
        question: &Question,
        budget_tokens: usize,
    ) -> Result<ChunkPlan, ChunkingError> {
        if document.is_empty() {
            return Err(ChunkingError::EmptyDocument);
        }
        if budget_tokens == 0 {
            return Err(ChunkingError::InvalidBudget);
        }

        let len = document.len();
        let strategy = self.select_strategy(len, budget_tokens);
        let keywords = question.keywords();

        let spans = if strategy.kind == StrategyKind::None {
            vec![ChunkSpan::new(0, len)]
        } else {
            slice_regular(document, &strategy)
        };
        let last_index = spans.len() - 1;
        let regular: Vec<DocumentChunk> = spans
            .iter()
            .enumerate()
            .map(|(i, span)| {
                let at_edge = i == 0 || i == last_index;
                self.build_chunk(document, *span, &keywords, at_edge, spans.len() > 1, None)
            })
            .collect();

        let critical: Vec<DocumentChunk> = if strategy.kind == StrategyKind::None {
            Vec::new()
        } else {
            find_critical_sections(document, self.options.critical_context)
                .into_iter()
                .map(|span| {
                    self.build_chunk(
                        document,
                        span,
                        &keywords,
                        false,
                        true,
                        Some(ChunkPriority::Critical),
                    )
                })
                .collect()
        };

        let (chunks, omitted) = select(regular, critical, strategy.max_chunk_count);

        let selected_bytes: usize = chunks.iter().map(|c| c.size_bytes).sum();
        let recommended_model = if selected_bytes > self.options.small_context_limit_bytes {
            ModelClass::LargeContext
        } else {
            ModelClass::SmallContext
        };

        let plan = ChunkPlan {
            chunks,
            omitted,
            strategy,
            recommended_model,
            document_len: len,
            fingerprint: Fingerprint::of_document(document),
        };

        if let Some(gap) = plan.first_gap() {
            return Err(ChunkingError::CoverageGap {
                start: gap.start,
                end: gap.end,
            });
        }
        Ok(plan)
    }

    fn build_chunk(
        &self,
        document: &str,
        span: ChunkSpan,
        keywords: &[String],
        at_edge: bool,
        multi_chunk: bool,
        priority: Option<ChunkPriority>,
    ) -> DocumentChunk {
        let content = &document[span.start..span.end];
        let tags = detect_tags(content);
        let score = score_chunk(content, keywords, &tags, at_edge, &self.options.weights);

        let kind = if tags.has_table {
            ChunkKind::Table
        } else if RE_SUMMARY_HEADING.is_match(content) {
            ChunkKind::Summary
        } else if multi_chunk && priority.is_none() && span.start == 0 {
            ChunkKind::Header
        } else if multi_chunk && priority.is_none() && span.end == document.len() {
            ChunkKind::Footer
        } else {
            ChunkKind::Content
        };

        DocumentChunk {
            content: content.to_string(),
            start_offset: span.start,
            end_offset: span.end,
            size_bytes: span.len(),
            estimated_tokens: estimate_tokens(span.len()),
            priority: priority.unwrap_or_else(|| ChunkPriority::from_score(score)),
            tags,
            kind,
            score,
        }
    }
}

/// Cut the document into overlapping, boundary-aware spans.
///
/// Each span is at most `max_chunk_size` bytes (plus char-boundary
/// snapping); consecutive spans share up to `overlap_size` bytes.
fn slice_regular(document: &str, strategy: &ChunkingStrategy) -> Vec<ChunkSpan> {
    let len = document.len();
    let max = strategy.max_chunk_size.max(1);
    let window = (max / 10).clamp(MIN_BOUNDARY_WINDOW, MAX_BOUNDARY_WINDOW);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        if len - start <= max {
            spans.push(ChunkSpan::new(start, len));
            break;
        }

        let hard_end = start + max;
        let natural = find_boundary(
            document,
            hard_end.saturating_sub(window),
            window,
            start + max / 2,
        )
        .map(|(cut, _)| cut)
        .filter(|cut| *cut <= ceil_char_boundary(document, hard_end));
        let mut end = natural.unwrap_or_else(|| floor_char_boundary(document, hard_end));
        if end <= start {
            end = ceil_char_boundary(document, start + 1);
        }
        spans.push(ChunkSpan::new(start, end));

        let next = floor_char_boundary(document, end.saturating_sub(strategy.overlap_size));
        start = if next <= start { end } else { next };
    }
    spans
}

/// Pick at most `max_count` chunks.
///
/// When regular chunks must be dropped, a quarter of the slots is reserved
/// for critical chunks. A critical chunk is only taken if no already
/// selected chunk contains it; unused reserved slots go back to regular
/// chunks.
fn select(
    regular: Vec<DocumentChunk>,
    critical: Vec<DocumentChunk>,
    max_count: usize,
) -> (Vec<DocumentChunk>, Vec<ChunkSpan>) {
    let max_count = max_count.max(1);

    let mut ranked = regular;
    ranked.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then(a.start_offset.cmp(&b.start_offset))
    });

    let reserve = if ranked.len() > max_count {
        (max_count / 4).min(critical.len())
    } else {
        0
    };
    let regular_slots = ranked.len().min(max_count - reserve);
    let mut remaining = ranked.split_off(regular_slots);
    let mut selected_regular = ranked;

    let mut free_slots = max_count - selected_regular.len();
    let mut selected_critical: Vec<DocumentChunk> = Vec::new();
    for chunk in critical {
        if free_slots == 0 {
            break;
        }
        let span = chunk.span();
        let covered = selected_regular
            .iter()
            .chain(selected_critical.iter())
            .any(|c| c.span().contains(&span));
        if !covered {
            selected_critical.push(chunk);
            free_slots -= 1;
        }
    }

    let refill = remaining.len().min(free_slots);
    selected_regular.extend(remaining.drain(..refill));

    let mut omitted: Vec<ChunkSpan> = remaining.iter().map(|c| c.span()).collect();
    omitted.sort();

    let mut chunks = selected_critical;
    chunks.sort_by_key(|c| c.start_offset);
    chunks.extend(selected_regular);
    (chunks, omitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::strategy::SizeBand;

    fn small_bands() -> SizeBands {
        SizeBands::new(vec![
            SizeBand {
                below_bytes: Some(200),
                strategy: ChunkingStrategy::new(StrategyKind::None, 200, 0, 1),
            },
            SizeBand {
                below_bytes: None,
                strategy: ChunkingStrategy::new(StrategyKind::Smart, 600, 40, 100),
            },
        ])
    }

    fn engine_with(bands: SizeBands) -> ChunkingEngine {
        ChunkingEngine::new(ChunkingOptions {
            bands,
            critical_context: 30,
            small_context_limit_bytes: 1_000,
            weights: ScoreWeights::default(),
        })
    }

    fn policy_text(paragraphs: usize) -> String {
        (0..paragraphs)
            .map(|i| {
                format!(
                    "Paragraph {} describes general terms of the agreement in plain words. \
                     It continues with more ordinary prose for padding purposes.\n\n",
                    i
                )
            })
            .collect()
    }

    fn question() -> Question {
        Question::new("What is the deductible amount?")
    }

    #[test]
    fn test_small_document_single_chunk() {
        let doc = "Short policy. Deductible is $500.";
        let plan = engine_with(small_bands()).plan(doc, &question(), 10_000).unwrap();
        assert_eq!(plan.strategy.kind, StrategyKind::None);
        assert_eq!(plan.chunks.len(), 1);
        assert_eq!(plan.chunks[0].content, doc);
        assert!(plan.is_complete());
        assert_eq!(plan.recommended_model, ModelClass::SmallContext);
    }

    #[test]
    fn test_small_document_over_budget_escalates() {
        let doc = policy_text(1);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10).unwrap();
        assert_eq!(plan.strategy.kind, StrategyKind::Smart);
        assert_eq!(plan.strategy.max_chunk_size, 40);
        assert!(plan.regular_chunks().count() > 1);
    }

    #[test]
    fn test_regular_chunks_cover_document() {
        let doc = policy_text(20);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        assert!(plan.is_complete());
        assert_eq!(plan.first_gap(), None);

        let mut spans: Vec<ChunkSpan> = plan.regular_chunks().map(|c| c.span()).collect();
        spans.sort();
        assert_eq!(spans.first().unwrap().start, 0);
        assert_eq!(spans.last().unwrap().end, doc.len());
        for pair in spans.windows(2) {
            assert!(pair[1].start <= pair[0].end, "gap between {:?}", pair);
        }
        for chunk in plan.regular_chunks() {
            assert!(chunk.size_bytes <= 600);
            assert_eq!(chunk.content, &doc[chunk.start_offset..chunk.end_offset]);
        }
    }

    #[test]
    fn test_cuts_land_on_paragraph_breaks() {
        let doc = policy_text(20);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        for chunk in plan.regular_chunks().filter(|c| c.end_offset < doc.len()) {
            assert!(
                chunk.content.ends_with("\n\n") || chunk.content.ends_with(". "),
                "chunk ends mid-sentence: {:?}",
                &chunk.content[chunk.content.len().saturating_sub(20)..]
            );
        }
    }

    #[test]
    fn test_keyword_chunks_rank_first() {
        let mut doc = policy_text(10);
        doc.push_str("The deductible amount is $2,500 per deductible occurrence.\n\n");
        doc.push_str(&policy_text(10));
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        let best = plan.regular_chunks().next().unwrap();
        assert!(best.content.contains("deductible"));
        let scores: Vec<f64> = plan.regular_chunks().map(|c| c.score).collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[test]
    fn test_chunk_count_ceiling_reports_omitted_spans() {
        let bands = SizeBands::new(vec![SizeBand {
            below_bytes: None,
            strategy: ChunkingStrategy::new(StrategyKind::Emergency, 300, 20, 4),
        }]);
        let doc = policy_text(30);
        let plan = engine_with(bands).plan(&doc, &question(), 10_000).unwrap();
        assert_eq!(plan.chunks.len(), 4);
        assert!(!plan.is_complete());
        // Dropped spans are explicit, so nothing is silently uncovered
        assert_eq!(plan.first_gap(), None);
    }

    #[test]
    fn test_critical_chunk_rescued_from_dropped_region() {
        let bands = SizeBands::new(vec![SizeBand {
            below_bytes: None,
            strategy: ChunkingStrategy::new(StrategyKind::Emergency, 300, 20, 4),
        }]);
        let mut doc = policy_text(15);
        doc.push_str("The annual premium is payable in advance.\n\n");
        doc.push_str(&policy_text(15));
        let plan = engine_with(bands).plan(&doc, &question(), 10_000).unwrap();

        let critical: Vec<&DocumentChunk> = plan.critical_chunks().collect();
        assert_eq!(critical.len(), 1);
        assert!(critical[0].content.contains("premium"));
        assert_eq!(plan.chunks[0].priority, ChunkPriority::Critical);
        assert_eq!(plan.chunks.len(), 4);
    }

    #[test]
    fn test_critical_chunk_dropped_when_contained() {
        // Everything fits: the critical term sits inside a kept regular chunk
        let doc = format!(
            "{}The premium is due.\n\n{}",
            policy_text(3),
            policy_text(3)
        );
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        for critical in plan.critical_chunks() {
            assert!(
                !plan
                    .regular_chunks()
                    .any(|c| c.span().contains(&critical.span()))
            );
        }
    }

    #[test]
    fn test_edge_chunks_marked() {
        let doc = policy_text(20);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        let first = plan.regular_chunks().find(|c| c.start_offset == 0).unwrap();
        let last = plan
            .regular_chunks()
            .find(|c| c.end_offset == doc.len())
            .unwrap();
        assert_eq!(first.kind, ChunkKind::Header);
        assert_eq!(last.kind, ChunkKind::Footer);
        assert!(first.score >= 5.0);
    }

    #[test]
    fn test_multibyte_document() {
        let doc = "Prime d'assurance: 1 200 €. Franchise élevée. ".repeat(40);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        assert_eq!(plan.first_gap(), None);
        for chunk in &plan.chunks {
            assert!(doc.is_char_boundary(chunk.start_offset));
            assert!(doc.is_char_boundary(chunk.end_offset));
        }
    }

    #[test]
    fn test_large_selection_recommends_large_context() {
        let doc = policy_text(40);
        let plan = engine_with(small_bands()).plan(&doc, &question(), 10_000).unwrap();
        assert!(plan.total_bytes() > 1_000);
        assert_eq!(plan.recommended_model, ModelClass::LargeContext);
    }

    #[test]
    fn test_errors() {
        let engine = ChunkingEngine::default();
        assert_eq!(
            engine.plan("", &question(), 100),
            Err(ChunkingError::EmptyDocument)
        );
        assert_eq!(
            engine.plan("text", &question(), 0),
            Err(ChunkingError::InvalidBudget)
        );
    }

    #[test]
    fn test_deterministic() {
        let doc = policy_text(25);
        let engine = engine_with(small_bands());
        let a = engine.plan(&doc, &question(), 10_000).unwrap();
        let b = engine.plan(&doc, &question(), 10_000).unwrap();
        assert_eq!(a, b);
    }
}
