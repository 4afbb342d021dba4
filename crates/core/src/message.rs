//! Wire message types for the chat WebSocket protocol.
//!
//! Two payloads flow over a session: the client sends a [`UserMessage`] and
//! receives a sequence of [`AssistantChunk`]s, the last of which always has
//! `is_final: true`. The `message_id` correlates every outbound chunk with
//! the inbound message that produced it.

use serde::{Deserialize, Serialize};

/// Inbound frame envelope, discriminated by the `type` field.
///
/// A frame whose `type` is anything other than `user_message` fails to
/// parse, which sessions report as a format error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientFrame {
    UserMessage(UserMessage),
}

/// Incoming user message sent over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMessage {
    /// Client-chosen id; echoed on every chunk of the reply.
    pub message_id: String,

    /// The question text.
    pub content: String,

    /// Optional conversation grouping id (informational only — the core
    /// retains no cross-turn history).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
}

/// Outgoing assistant message chunk sent over the WebSocket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename = "assistant_chunk")]
pub struct AssistantChunk {
    /// The `message_id` of the inbound message this chunk answers.
    pub message_id: String,

    /// Incremental text. Empty on the plain completion marker.
    pub content: String,

    /// `true` on exactly the last chunk of a turn.
    #[serde(default)]
    pub is_final: bool,
}

impl AssistantChunk {
    /// A non-final chunk carrying one fragment of generated text.
    pub fn partial(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
            is_final: false,
        }
    }

    /// The empty terminal chunk that signals turn completion.
    pub fn done(message_id: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: String::new(),
            is_final: true,
        }
    }

    /// A terminal chunk carrying a user-visible error message.
    pub fn fatal(message_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            message_id: message_id.into(),
            content: content.into(),
            is_final: true,
        }
    }
}
