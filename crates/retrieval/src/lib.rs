//! Retrieval-augmented context assembly for GraphTutor.
//!
//! [`ContextBuilder`] queries a [`KnowledgeStore`] for candidate Q&A records,
//! ranks them against the query embedding, and composes a bounded textual
//! context block. Retrieval is an enhancement, not a correctness requirement:
//! every failure mode degrades to fallback text instead of erroring, so a
//! broken store can never abort a user's turn.
//!
//! [`KnowledgeStore`]: graphtutor_core::KnowledgeStore

pub mod context;
pub mod memory_store;

pub use context::{ContextBuilder, NO_MATCH_FALLBACK, NO_STORE_FALLBACK};
pub use memory_store::InMemoryStore;
