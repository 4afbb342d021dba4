//! Context source trait — the seam between retrieval and the session loop.
//!
//! The production implementation (`graphtutor-retrieval::ContextBuilder`) is
//! fail-soft and never returns an error: store failures degrade to fallback
//! text inside `build_context`. The trait still returns a `Result` so the
//! session pipeline can guard the path anyway and so test fakes can exercise
//! the warning branch.

use async_trait::async_trait;

use crate::error::StoreError;

/// Builds a bounded textual context block for a user query.
#[async_trait]
pub trait ContextSource: Send + Sync {
    /// Compose a context block from the top `top_k` retrieved snippets.
    ///
    /// Must return a non-empty string on success. `top_k = 0` is valid and
    /// selects no snippets.
    async fn build_context(
        &self,
        query: &str,
        top_k: usize,
    ) -> std::result::Result<String, StoreError>;
}
