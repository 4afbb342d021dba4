//! Per-connection turn pipeline.
//!
//! One [`SessionPipeline`] drives one turn at a time: parse the inbound
//! payload, build retrieval context, open the completion stream, and forward
//! fragments as outbound chunks. Turns are strictly sequential on a
//! connection — a turn fully resolves, including its final chunk, before the
//! next inbound message is read.
//!
//! Failure isolation per stage:
//! - malformed payload → one final format-error chunk, session continues
//! - context-build failure → one non-final warning chunk, turn continues
//!   with the raw query (the real builder is fail-soft; this guards fakes
//!   and future sources)
//! - completion failure (missing key, transport) → one final error chunk,
//!   turn ends, session continues
//! - outbound send failure → the client is gone; stop promptly and quietly
//!
//! Invariant: every accepted inbound message produces exactly one chunk with
//! `is_final: true`, and it is always the last chunk for that message id.

use std::sync::Arc;

use graphtutor_core::completion::CompletionClient;
use graphtutor_core::context::ContextSource;
use graphtutor_core::error::SessionError;
use graphtutor_core::message::{AssistantChunk, ClientFrame, UserMessage};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Fixed system instruction sent with every completion request.
pub const SYSTEM_PROMPT: &str = "You are an educational Q&A assistant. \
    Use the provided knowledge graph context when helpful, and give clear, \
    concise explanations suitable for students.";

/// User-visible error for a payload that fails schema validation.
const FORMAT_ERROR: &str = "Invalid message format.";

/// User-visible warning when context retrieval failed; the turn continues.
const CONTEXT_ERROR: &str = "An error occurred while retrieving context from \
    the knowledge graph. I will answer without it.";

/// User-visible error when generation failed; the turn ends.
const GENERATION_ERROR: &str =
    "An error occurred while generating the answer. Please try again later.";

const DEFAULT_TOP_K: usize = 5;

/// Sequences one connection's turns over shared collaborators.
///
/// Constructed once per process and shared across sessions: it holds no
/// per-turn state, only `Arc`s to the context source and completion client.
pub struct SessionPipeline {
    retrieval: Arc<dyn ContextSource>,
    completion: Arc<dyn CompletionClient>,
    model: String,
    top_k: usize,
}

impl SessionPipeline {
    pub fn new(
        retrieval: Arc<dyn ContextSource>,
        completion: Arc<dyn CompletionClient>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retrieval,
            completion,
            model: model.into(),
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many ranked snippets go into each context block.
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Process one inbound text frame through the full turn state machine.
    ///
    /// Chunks are emitted in order through `outbound`; each send completes
    /// before the next upstream fragment is pulled. The only error this
    /// returns is [`SessionError::Disconnected`], when the outbound side is
    /// gone — every application-level failure resolves into chunks instead.
    pub async fn run_turn(
        &self,
        raw: &str,
        outbound: &mpsc::Sender<AssistantChunk>,
    ) -> Result<(), SessionError> {
        let message: UserMessage = match serde_json::from_str(raw) {
            Ok(ClientFrame::UserMessage(m)) => m,
            Err(e) => {
                warn!(error = %e, "Invalid inbound payload");
                return self
                    .send(outbound, AssistantChunk::fatal("unknown", FORMAT_ERROR))
                    .await;
            }
        };

        let user_prompt = match self
            .retrieval
            .build_context(&message.content, self.top_k)
            .await
        {
            Ok(context) => format!("{context}\n\nUser question: {}", message.content),
            Err(e) => {
                error!(error = %e, "Context build failed; answering without context");
                self.send(
                    outbound,
                    AssistantChunk::partial(&message.message_id, CONTEXT_ERROR),
                )
                .await?;
                message.content.clone()
            }
        };

        let mut fragments = match self
            .completion
            .stream_chat(SYSTEM_PROMPT, &user_prompt, &self.model)
            .await
        {
            Ok(rx) => rx,
            Err(e) => {
                error!(error = %e, "Completion stream failed to open");
                return self
                    .send(
                        outbound,
                        AssistantChunk::fatal(&message.message_id, GENERATION_ERROR),
                    )
                    .await;
            }
        };

        while let Some(item) = fragments.recv().await {
            match item {
                Ok(fragment) => {
                    // Forward before pulling the next fragment; arrival
                    // order is emission order.
                    self.send(
                        outbound,
                        AssistantChunk::partial(&message.message_id, fragment),
                    )
                    .await?;
                }
                Err(e) => {
                    // Partial output already forwarded stays valid; the
                    // failure is reported afterward as the final chunk.
                    error!(error = %e, "Completion stream interrupted");
                    return self
                        .send(
                            outbound,
                            AssistantChunk::fatal(&message.message_id, GENERATION_ERROR),
                        )
                        .await;
                }
            }
        }

        // Clean end of stream: one empty terminal chunk signals completion.
        self.send(outbound, AssistantChunk::done(&message.message_id))
            .await
    }

    async fn send(
        &self,
        outbound: &mpsc::Sender<AssistantChunk>,
        chunk: AssistantChunk,
    ) -> Result<(), SessionError> {
        outbound.send(chunk).await.map_err(|_| {
            info!("Outbound connection closed mid-turn");
            SessionError::Disconnected
        })
    }
}
