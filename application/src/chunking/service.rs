//! Chunking service: the pure engine behind a bounded plan cache

use docquorum_domain::{ChunkPlan, ChunkingEngine, ChunkingError, Fingerprint, Question};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::debug;

/// Chunks documents for a context budget, caching plans by fingerprint of
/// content, question and budget.
///
/// The cache is bounded and evicts the oldest inserted plan first; lookups
/// do not refresh an entry. A capacity of zero disables caching.
pub struct ChunkingService {
    engine: ChunkingEngine,
    cache: Option<Mutex<LruCache<Fingerprint, Arc<ChunkPlan>>>>,
}

impl ChunkingService {
    pub fn new(engine: ChunkingEngine, cache_capacity: usize) -> Self {
        let cache = NonZeroUsize::new(cache_capacity).map(|cap| Mutex::new(LruCache::new(cap)));
        Self { engine, cache }
    }

    pub fn engine(&self) -> &ChunkingEngine {
        &self.engine
    }

    /// Chunk `document` for `question` so every chunk fits `budget_tokens`.
    pub fn chunk(
        &self,
        document: &str,
        question: &Question,
        budget_tokens: usize,
    ) -> Result<Arc<ChunkPlan>, ChunkingError> {
        let key = Fingerprint::of_request(
            &Fingerprint::of_document(document),
            question.content(),
            budget_tokens,
        );

        if let Some(cache) = &self.cache
            && let Some(plan) = cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .peek(&key)
        {
            debug!("Chunk plan cache hit ({})", key.short());
            return Ok(plan.clone());
        }

        let plan = Arc::new(self.engine.plan(document, question, budget_tokens)?);
        debug!(
            "Chunked {} bytes with {} strategy into {} chunks ({} omitted)",
            plan.document_len,
            plan.strategy.kind.as_str(),
            plan.chunks.len(),
            plan.omitted.len()
        );

        if let Some(cache) = &self.cache {
            cache
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(key, plan.clone());
        }
        Ok(plan)
    }

    /// Like [`chunk`](Self::chunk) for raw bytes, which must be valid UTF-8.
    pub fn chunk_bytes(
        &self,
        document: &[u8],
        question: &Question,
        budget_tokens: usize,
    ) -> Result<Arc<ChunkPlan>, ChunkingError> {
        let text = std::str::from_utf8(document).map_err(|e| ChunkingError::InvalidEncoding {
            offset: e.valid_up_to(),
        })?;
        self.chunk(text, question, budget_tokens)
    }

    /// Number of cached plans.
    pub fn cached(&self) -> usize {
        self.cache
            .as_ref()
            .map_or(0, |c| c.lock().unwrap_or_else(PoisonError::into_inner).len())
    }

    /// Drop every cached plan.
    pub fn reset(&self) {
        if let Some(cache) = &self.cache {
            cache.lock().unwrap_or_else(PoisonError::into_inner).clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docquorum_domain::{ChunkingOptions, ChunkingStrategy, SizeBand, SizeBands, StrategyKind};

    fn service(capacity: usize) -> ChunkingService {
        let bands = SizeBands::new(vec![
            SizeBand {
                below_bytes: Some(200),
                strategy: ChunkingStrategy::new(StrategyKind::None, 200, 0, 1),
            },
            SizeBand {
                below_bytes: None,
                strategy: ChunkingStrategy::new(StrategyKind::Smart, 600, 40, 100),
            },
        ]);
        let engine = ChunkingEngine::new(ChunkingOptions {
            bands,
            ..ChunkingOptions::default()
        });
        ChunkingService::new(engine, capacity)
    }

    fn document(n: usize) -> String {
        (0..n)
            .map(|i| format!("Section {}. The insured property is listed here.\n\n", i))
            .collect()
    }

    #[test]
    fn test_cache_hit_returns_same_plan() {
        let service = service(4);
        let question = Question::new("What is covered?");
        let doc = document(40);

        let first = service.chunk(&doc, &question, 1_000).unwrap();
        let second = service.chunk(&doc, &question, 1_000).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(service.cached(), 1);
    }

    #[test]
    fn test_key_includes_question_and_budget() {
        let service = service(4);
        let doc = document(40);

        let a = service.chunk(&doc, &Question::new("What is covered?"), 1_000).unwrap();
        let b = service.chunk(&doc, &Question::new("Who is insured?"), 1_000).unwrap();
        let c = service.chunk(&doc, &Question::new("What is covered?"), 500).unwrap();

        assert!(!Arc::ptr_eq(&a, &b));
        assert!(!Arc::ptr_eq(&a, &c));
        assert_eq!(service.cached(), 3);
    }

    #[test]
    fn test_evicts_oldest_insertion_first() {
        let service = service(2);
        let question = Question::new("What is covered?");
        let (d1, d2, d3) = (document(10), document(11), document(12));

        let first = service.chunk(&d1, &question, 1_000).unwrap();
        service.chunk(&d2, &question, 1_000).unwrap();
        // A hit does not refresh d1.
        service.chunk(&d1, &question, 1_000).unwrap();
        service.chunk(&d3, &question, 1_000).unwrap();

        assert_eq!(service.cached(), 2);
        let again = service.chunk(&d1, &question, 1_000).unwrap();
        assert!(!Arc::ptr_eq(&first, &again));
        assert_eq!(*first, *again);
    }

    #[test]
    fn test_reset_clears_cache() {
        let service = service(4);
        service
            .chunk(&document(10), &Question::new("What is covered?"), 1_000)
            .unwrap();
        service.reset();
        assert_eq!(service.cached(), 0);
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let service = service(0);
        let question = Question::new("What is covered?");
        let doc = document(10);
        let a = service.chunk(&doc, &question, 1_000).unwrap();
        let b = service.chunk(&doc, &question, 1_000).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(a, b);
        assert_eq!(service.cached(), 0);
    }

    #[test]
    fn test_chunk_bytes_rejects_invalid_utf8() {
        let service = service(4);
        let mut bytes = b"Coverage: full".to_vec();
        bytes.push(0xff);

        let result = service.chunk_bytes(&bytes, &Question::new("q"), 1_000);
        assert_eq!(result, Err(ChunkingError::InvalidEncoding { offset: 14 }));
    }

    #[test]
    fn test_errors_are_not_cached() {
        let service = service(4);
        let result = service.chunk("", &Question::new("q"), 1_000);
        assert_eq!(result, Err(ChunkingError::EmptyDocument));
        assert_eq!(service.cached(), 0);
    }
}
