//! Completion client trait — the abstraction over the streaming LLM endpoint.
//!
//! A `CompletionClient` turns a (system prompt, user content) pair into a
//! lazy, finite sequence of text fragments delivered through an mpsc
//! receiver. Fragments arrive in generation order; the consumer forwards
//! each one before pulling the next, so arrival order is emission order.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::error::CompletionError;

/// Receiver side of a completion fragment stream.
///
/// Each item is one incremental piece of generated text, or the single
/// terminal error when the upstream transport fails mid-stream. Dropping the
/// receiver cancels production and releases the upstream stream handle.
pub type FragmentReceiver = mpsc::Receiver<std::result::Result<String, CompletionError>>;

/// The streaming completion contract.
///
/// Implementations must be safe to share across concurrent sessions (one
/// shared HTTP connection pool). The stream is finite and not restartable;
/// no retry is performed inside the client — a turn gets a single attempt.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Open a streaming completion request.
    ///
    /// Fails fast with [`CompletionError::AuthenticationFailed`] when no API
    /// credential is configured, before any network activity. Transport
    /// failures during setup (non-2xx status, connect errors) are returned
    /// here; failures after streaming has begun surface as one `Err` item on
    /// the receiver, after whatever fragments were already yielded.
    async fn stream_chat(
        &self,
        system_prompt: &str,
        user_content: &str,
        model: &str,
    ) -> std::result::Result<FragmentReceiver, CompletionError>;
}
