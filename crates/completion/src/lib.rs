//! DeepSeek streaming chat completion client.
//!
//! Talks to the OpenAI-compatible `/v1/chat/completions` endpoint with
//! `stream: true` and parses the SSE response into plain text fragments.
//!
//! Failure contract:
//! - Missing API key → `AuthenticationFailed` before any network activity
//! - Non-2xx status / connect error → returned from `stream_chat` itself
//! - Mid-stream transport failure → one `Err(StreamInterrupted)` item on
//!   the receiver, after the fragments already delivered
//! - Malformed SSE frame → logged at warn and skipped, stream continues

use async_trait::async_trait;
use futures::StreamExt;
use graphtutor_core::completion::{CompletionClient, FragmentReceiver};
use graphtutor_core::error::CompletionError;
use serde::Deserialize;
use tracing::{debug, warn};

/// Channel capacity for in-flight fragments per stream.
const FRAGMENT_BUFFER: usize = 64;

/// Streaming client for the DeepSeek chat completions API.
///
/// Holds one `reqwest::Client` (a shared connection pool), so a single
/// instance serves every concurrent session.
pub struct DeepSeekClient {
    api_key: Option<String>,
    api_base: String,
    client: reqwest::Client,
}

impl DeepSeekClient {
    /// Create a new client.
    ///
    /// `api_key = None` builds a client whose every `stream_chat` call fails
    /// fast with an authentication error; the process can still start and
    /// serve degraded sessions.
    pub fn new(api_key: Option<String>, api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            api_key,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Whether a credential is configured.
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}

#[async_trait]
impl CompletionClient for DeepSeekClient {
    async fn stream_chat(
        &self,
        system_prompt: &str,
        user_content: &str,
        model: &str,
    ) -> Result<FragmentReceiver, CompletionError> {
        let Some(api_key) = &self.api_key else {
            return Err(CompletionError::AuthenticationFailed(
                "DeepSeek API key is missing".into(),
            ));
        };

        let url = format!("{}/v1/chat/completions", self.api_base);
        let body = serde_json::json!({
            "model": model,
            "messages": [
                { "role": "system", "content": system_prompt },
                { "role": "user", "content": user_content },
            ],
            "stream": true,
        });

        debug!(model = %model, "Sending streaming completion request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .header("Accept", "text/event-stream")
            .json(&body)
            .send()
            .await
            .map_err(|e| CompletionError::Network(e.to_string()))?;

        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return Err(CompletionError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if !(200..300).contains(&status) {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Completion endpoint returned error");
            return Err(CompletionError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let (tx, rx) = tokio::sync::mpsc::channel(FRAGMENT_BUFFER);

        // Read the SSE byte stream and forward content deltas as fragments.
        tokio::spawn(async move {
            let mut byte_stream = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk_result) = byte_stream.next().await {
                let bytes = match chunk_result {
                    Ok(b) => b,
                    Err(e) => {
                        let _ = tx
                            .send(Err(CompletionError::StreamInterrupted(e.to_string())))
                            .await;
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&bytes));

                // Process complete lines
                while let Some(line_end) = buffer.find('\n') {
                    let line = buffer[..line_end].trim_end_matches('\r').to_string();
                    buffer = buffer[line_end + 1..].to_string();

                    // Skip empty lines and SSE comments
                    if line.is_empty() || line.starts_with(':') {
                        continue;
                    }

                    let data = match line.strip_prefix("data: ") {
                        Some(data) => data.trim(),
                        None => line.trim(),
                    };

                    // "[DONE]" signals clean end of stream
                    if data == "[DONE]" {
                        return;
                    }

                    match serde_json::from_str::<StreamResponse>(data) {
                        Ok(stream_resp) => {
                            let content = stream_resp
                                .choices
                                .first()
                                .and_then(|c| c.delta.content.as_deref());
                            if let Some(content) = content {
                                if !content.is_empty()
                                    && tx.send(Ok(content.to_string())).await.is_err()
                                {
                                    return; // receiver dropped — session ended
                                }
                            }
                        }
                        Err(e) => {
                            warn!(error = %e, "Skipping unparseable completion stream frame");
                        }
                    }
                }
            }
            // Stream ended without [DONE]; the closed channel is the
            // termination signal, same as a clean finish.
        });

        Ok(rx)
    }
}

// --- Streaming SSE types ---

/// A single SSE `data: {...}` chunk from a streaming response.
#[derive(Debug, Deserialize)]
struct StreamResponse {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reported_before_network() {
        let client = DeepSeekClient::new(None, "https://api.deepseek.com");
        assert!(!client.has_api_key());

        let result = client.stream_chat("sys", "user", "deepseek-chat").await;
        assert!(matches!(
            result,
            Err(CompletionError::AuthenticationFailed(_))
        ));
    }

    #[test]
    fn base_url_trailing_slash_trimmed() {
        let client = DeepSeekClient::new(Some("sk-test".into()), "https://api.deepseek.com/");
        assert_eq!(client.api_base, "https://api.deepseek.com");
    }

    // --- SSE parsing tests ---

    #[test]
    fn parse_stream_content_delta() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"},"finish_reason":null}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("Hello"));
    }

    #[test]
    fn parse_stream_empty_delta() {
        let data = r#"{"choices":[{"delta":{},"finish_reason":"stop"}]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].delta.content.is_none());
    }

    #[test]
    fn parse_stream_no_choices() {
        let data = r#"{"choices":[]}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices.is_empty());
    }

    #[test]
    fn malformed_frame_fails_to_parse() {
        assert!(serde_json::from_str::<StreamResponse>("not json").is_err());
    }

    #[test]
    fn parse_ignores_unknown_fields() {
        let data = r#"{"id":"cmpl-1","model":"deepseek-chat","choices":[{"index":0,"delta":{"role":"assistant","content":"A "},"finish_reason":null}],"usage":null}"#;
        let parsed: StreamResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.choices[0].delta.content.as_deref(), Some("A "));
    }
}
