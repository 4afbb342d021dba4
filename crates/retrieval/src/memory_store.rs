//! In-memory knowledge store — the shipped implementation of the store
//! contract, and the substitutable fake for tests.
//!
//! Filtering mirrors the graph query the original backend ran: a
//! case-insensitive contains match across topic, question, and answer text,
//! capped at the caller's limit. Re-ranking is not our job — the context
//! builder does that with embeddings.

use async_trait::async_trait;
use graphtutor_core::error::StoreError;
use graphtutor_core::store::{KnowledgeStore, QaCandidate};

/// A knowledge store backed by an in-process Vec.
pub struct InMemoryStore {
    entries: Vec<QaCandidate>,
}

impl InMemoryStore {
    pub fn new(entries: Vec<QaCandidate>) -> Self {
        Self { entries }
    }

    /// A store seeded with the demo topics used for first-run walkthroughs.
    pub fn with_demo_entries() -> Self {
        Self::new(vec![
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
        ])
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryStore {
    async fn get_related_qa(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<QaCandidate>, StoreError> {
        let query_lower = query.to_lowercase();

        Ok(self
            .entries
            .iter()
            .filter(|e| {
                e.topic.to_lowercase().contains(&query_lower)
                    || e.question.to_lowercase().contains(&query_lower)
                    || e.answer.to_lowercase().contains(&query_lower)
            })
            .take(limit)
            .cloned()
            .collect())
    }
}
