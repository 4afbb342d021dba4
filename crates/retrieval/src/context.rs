//! Context assembly — embed, rank, select, compose.

use std::sync::Arc;

use async_trait::async_trait;
use graphtutor_core::context::ContextSource;
use graphtutor_core::error::StoreError;
use graphtutor_core::store::{KnowledgeStore, QaCandidate};
use graphtutor_embedding::{embed, rank_by_similarity};
use tracing::{debug, info, warn};

/// Context returned when no knowledge store is configured or the store
/// fails. Degraded mode, not an error.
pub const NO_STORE_FALLBACK: &str = "No knowledge graph context is available.";

/// Context returned when the store is reachable but has nothing related.
pub const NO_MATCH_FALLBACK: &str =
    "No directly related entries were found in the knowledge graph.";

/// Instructional preamble placed before the selected snippets.
const CONTEXT_PREAMBLE: &str =
    "You are an educational assistant using the following knowledge graph entries as context.";

/// Upper bound on raw candidates fetched from the store per query.
const CANDIDATE_LIMIT: usize = 20;

/// Assembles a ranked, bounded context block for a user query.
///
/// Shared read-only across sessions; construct once at process start and
/// hand out `Arc`s.
pub struct ContextBuilder {
    store: Option<Arc<dyn KnowledgeStore>>,
}

impl ContextBuilder {
    /// Create a builder over an optional knowledge store.
    ///
    /// `None` puts the builder in permanent degraded mode: every query gets
    /// the fixed fallback sentence with no embedding work performed.
    pub fn new(store: Option<Arc<dyn KnowledgeStore>>) -> Self {
        Self { store }
    }

    /// Format one candidate into the snippet template used for both
    /// embedding and the final context block.
    fn snippet(candidate: &QaCandidate) -> String {
        let topic = if candidate.topic.is_empty() {
            "General"
        } else {
            &candidate.topic
        };
        format!(
            "Topic: {}\nQuestion: {}\nAnswer: {}",
            topic, candidate.question, candidate.answer
        )
    }

    /// Compose the context block for `query` from the top `top_k` snippets.
    ///
    /// Always returns a non-empty string and never fails: store errors are
    /// logged at warn and converted to the degraded-mode fallback.
    pub async fn build(&self, query: &str, top_k: usize) -> String {
        let Some(store) = &self.store else {
            warn!("No knowledge store configured; using empty retrieval context");
            return NO_STORE_FALLBACK.to_string();
        };

        let query_embedding = embed(query);

        let candidates = match store.get_related_qa(query, CANDIDATE_LIMIT).await {
            Ok(candidates) => candidates,
            Err(e) => {
                warn!(error = %e, "Knowledge store query failed; degrading to fallback context");
                return NO_STORE_FALLBACK.to_string();
            }
        };

        if candidates.is_empty() {
            info!("No knowledge store candidates found for query");
            return NO_MATCH_FALLBACK.to_string();
        }

        let snippets: Vec<String> = candidates.iter().map(Self::snippet).collect();
        let snippet_embeddings: Vec<Vec<f32>> = snippets.iter().map(|s| embed(s)).collect();
        let rankings = rank_by_similarity(&query_embedding, &snippet_embeddings);

        debug!(
            candidates = candidates.len(),
            selected = top_k.min(candidates.len()),
            "Ranked retrieval candidates"
        );

        let mut context = format!("{CONTEXT_PREAMBLE}\n\n");
        for (entry_no, (idx, _score)) in rankings.iter().take(top_k).enumerate() {
            context.push_str(&format!("Entry {}:\n{}\n\n", entry_no + 1, snippets[*idx]));
        }

        context.trim().to_string()
    }
}

#[async_trait]
impl ContextSource for ContextBuilder {
    async fn build_context(&self, query: &str, top_k: usize) -> Result<String, StoreError> {
        Ok(self.build(query, top_k).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedStore {
        candidates: Vec<QaCandidate>,
    }

    #[async_trait]
    impl KnowledgeStore for FixedStore {
        async fn get_related_qa(
            &self,
            _query: &str,
            limit: usize,
        ) -> Result<Vec<QaCandidate>, StoreError> {
            Ok(self.candidates.iter().take(limit).cloned().collect())
        }
    }

    struct FailingStore;

    #[async_trait]
    impl KnowledgeStore for FailingStore {
        async fn get_related_qa(
            &self,
            _query: &str,
            _limit: usize,
        ) -> Result<Vec<QaCandidate>, StoreError> {
            Err(StoreError::QueryFailed("connection refused".into()))
        }
    }

    fn demo_candidates() -> Vec<QaCandidate> {
        vec![
            QaCandidate::new(
                "Linear Algebra",
                "What is a matrix?",
                "A matrix is a rectangular array of numbers arranged in rows and columns.",
            ),
            QaCandidate::new(
                "Calculus",
                "What is a derivative?",
                "A derivative measures how a function changes as its input changes.",
            ),
            QaCandidate::new(
                "Machine Learning",
                "What is supervised learning?",
                "Supervised learning uses labeled data to train a model to make predictions.",
            ),
        ]
    }

    fn count_entries(context: &str) -> usize {
        (1..)
            .take_while(|i| context.contains(&format!("Entry {i}:")))
            .count()
    }

    #[tokio::test]
    async fn no_store_returns_fixed_fallback() {
        let builder = ContextBuilder::new(None);
        assert_eq!(builder.build("anything", 5).await, NO_STORE_FALLBACK);
        assert_eq!(builder.build("something else", 5).await, NO_STORE_FALLBACK);
    }

    #[tokio::test]
    async fn empty_result_returns_distinct_fallback() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore { candidates: vec![] })));
        assert_eq!(builder.build("derivative", 5).await, NO_MATCH_FALLBACK);
    }

    #[tokio::test]
    async fn store_failure_degrades_to_fallback() {
        let builder = ContextBuilder::new(Some(Arc::new(FailingStore)));
        assert_eq!(builder.build("derivative", 5).await, NO_STORE_FALLBACK);
    }

    #[tokio::test]
    async fn context_contains_numbered_entries() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore {
            candidates: demo_candidates(),
        })));
        let context = builder.build("what is a derivative", 5).await;

        assert!(context.starts_with(CONTEXT_PREAMBLE));
        assert_eq!(count_entries(&context), 3);
        assert!(context.contains("Topic: Calculus"));
        // Trailing whitespace is trimmed
        assert_eq!(context, context.trim());
    }

    #[tokio::test]
    async fn best_match_is_entry_one() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore {
            candidates: demo_candidates(),
        })));
        let context = builder
            .build("what is a derivative how does a function change", 1)
            .await;

        assert_eq!(count_entries(&context), 1);
        assert!(context.contains("Entry 1:\nTopic: Calculus"));
    }

    #[tokio::test]
    async fn top_k_caps_selection() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore {
            candidates: demo_candidates(),
        })));
        let context = builder.build("learning", 2).await;
        assert_eq!(count_entries(&context), 2);
    }

    #[tokio::test]
    async fn top_k_zero_yields_preamble_only() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore {
            candidates: demo_candidates(),
        })));
        let context = builder.build("learning", 0).await;
        assert_eq!(context, CONTEXT_PREAMBLE);
        assert!(!context.is_empty());
    }

    #[tokio::test]
    async fn empty_topic_becomes_general() {
        let builder = ContextBuilder::new(Some(Arc::new(FixedStore {
            candidates: vec![QaCandidate::new("", "What is x?", "x is a variable.")],
        })));
        let context = builder.build("variable", 5).await;
        assert!(context.contains("Topic: General"));
    }

    #[tokio::test]
    async fn context_source_impl_never_errors() {
        let builder = ContextBuilder::new(Some(Arc::new(FailingStore)));
        let result = ContextSource::build_context(&builder, "q", 5).await;
        assert_eq!(result.unwrap(), NO_STORE_FALLBACK);
    }
}
