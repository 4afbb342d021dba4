//! # GraphTutor Core
//!
//! Domain types, traits, and error definitions for the GraphTutor chat relay.
//! This crate has **zero framework dependencies** — it defines the wire
//! protocol and collaborator contracts that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator is defined as a trait here:
//! - [`KnowledgeStore`] — the graph-backed Q&A store (in-memory, Neo4j, ...)
//! - [`ContextSource`] — retrieval-augmented context assembly
//! - [`CompletionClient`] — the streaming LLM completion endpoint
//!
//! Implementations live in their respective crates. The session pipeline is
//! constructed with trait objects, so every stage can be substituted with a
//! fake in tests.

pub mod completion;
pub mod context;
pub mod error;
pub mod message;
pub mod store;

// Re-export key types at crate root for ergonomics
pub use completion::{CompletionClient, FragmentReceiver};
pub use context::ContextSource;
pub use error::{CompletionError, Error, Result, SessionError, StoreError};
pub use message::{AssistantChunk, ClientFrame, UserMessage};
pub use store::{KnowledgeStore, QaCandidate};
