//! Knowledge store trait — the abstraction over the graph-backed Q&A store.
//!
//! The store is an opaque capability: any backend that can return candidate
//! question/answer records for a query satisfies the contract. Query
//! execution and filtering (substring match over topic/question/answer) are
//! the store's own responsibility.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// One candidate Q&A record returned by the store.
///
/// Candidates have no identity beyond their position in a retrieval batch;
/// they live only for the duration of one `build_context` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaCandidate {
    /// Topic the question belongs to (e.g. "Calculus").
    pub topic: String,

    /// The stored question text.
    pub question: String,

    /// The stored answer text.
    pub answer: String,
}

impl QaCandidate {
    pub fn new(
        topic: impl Into<String>,
        question: impl Into<String>,
        answer: impl Into<String>,
    ) -> Self {
        Self {
            topic: topic.into(),
            question: question.into(),
            answer: answer.into(),
        }
    }
}

/// The knowledge store contract.
///
/// Implementations must be safe to share across concurrent sessions.
/// An error return is treated by the retrieval layer as "no candidates":
/// logged and degraded, never surfaced to the end user.
#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// Fetch up to `limit` candidate Q&A records related to `query`.
    ///
    /// The match is a case-insensitive contains filter over topic, question,
    /// and answer text. The result may be empty.
    async fn get_related_qa(
        &self,
        query: &str,
        limit: usize,
    ) -> std::result::Result<Vec<QaCandidate>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidate_constructor() {
        let c = QaCandidate::new("Calculus", "What is a derivative?", "A rate of change.");
        assert_eq!(c.topic, "Calculus");
        assert_eq!(c.question, "What is a derivative?");
    }

    #[test]
    fn candidate_serialization_roundtrip() {
        let c = QaCandidate::new("Algebra", "q", "a");
        let json = serde_json::to_string(&c).unwrap();
        let parsed: QaCandidate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, c);
    }
}
