//! OpenAI chat completion request and response types.

use backend_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// A chat message as the API expects it.
#[derive(Debug, Clone, Serialize)]
pub struct ApiMessage<'a> {
    /// Role: "system", "user", or "assistant"
    pub role: &'static str,
    /// Message content
    pub content: &'a str,
}

impl<'a> From<&'a ChatMessage> for ApiMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.api_name(),
            content: &msg.content,
        }
    }
}

/// Chat completion request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest<'a> {
    /// Model to use
    pub model: &'a str,
    /// Messages in the conversation
    pub messages: Vec<ApiMessage<'a>>,
    /// Whether to stream deltas as server-sent events
    pub stream: bool,
    /// End-user identifier for abuse monitoring
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<&'a str>,
}

/// One streamed `chat.completion.chunk` event.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChunk {
    /// Streamed choices (normally exactly one)
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
}

/// A streamed choice.
#[derive(Debug, Clone, Deserialize)]
pub struct ChunkChoice {
    /// Incremental message content
    #[serde(default)]
    pub delta: Delta,
    /// Set on the last chunk of a choice
    pub finish_reason: Option<String>,
}

/// Incremental message content.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Delta {
    /// Text fragment (absent on role-only and final chunks)
    pub content: Option<String>,
}

impl ChatCompletionChunk {
    /// Concatenated text of every choice delta in this chunk.
    pub fn text(&self) -> String {
        self.choices
            .iter()
            .filter_map(|c| c.delta.content.as_deref())
            .collect()
    }
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ApiErrorDetails,
}

/// API error details.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorDetails {
    /// Error message
    pub message: String,
    /// Error type
    #[serde(rename = "type")]
    pub error_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_skips_missing_user() {
        let messages = vec![ChatMessage::user("hi")];
        let request = ChatCompletionRequest {
            model: "gpt-4o",
            messages: messages.iter().map(ApiMessage::from).collect(),
            stream: false,
            user: None,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("user").is_none());
        assert_eq!(value["messages"][0]["role"], "user");
    }

    #[test]
    fn test_chunk_text() {
        let raw = r#"{"id":"c1","object":"chat.completion.chunk","choices":[{"index":0,"delta":{"content":"Hel"},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(raw).unwrap();
        assert_eq!(chunk.text(), "Hel");
    }

    #[test]
    fn test_role_only_chunk_has_no_text() {
        let raw = r#"{"choices":[{"index":0,"delta":{"role":"assistant"},"finish_reason":null}]}"#;
        let chunk: ChatCompletionChunk = serde_json::from_str(raw).unwrap();
        assert!(chunk.text().is_empty());
    }

    #[test]
    fn test_api_error_parse() {
        let raw = r#"{"error":{"message":"The model `x` does not exist","type":"invalid_request_error"}}"#;
        let err: ApiError = serde_json::from_str(raw).unwrap();
        assert_eq!(err.error.message, "The model `x` does not exist");
        assert_eq!(err.error.error_type.as_deref(), Some("invalid_request_error"));
    }
}
