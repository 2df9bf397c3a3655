//! Ollama `/api/chat` request and error types.

use backend_core::ChatMessage;
use serde::{Deserialize, Serialize};

/// A chat message as Ollama expects it.
#[derive(Debug, Clone, Serialize)]
pub struct OllamaMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

impl<'a> From<&'a ChatMessage> for OllamaMessage<'a> {
    fn from(msg: &'a ChatMessage) -> Self {
        Self {
            role: msg.role.api_name(),
            content: &msg.content,
        }
    }
}

/// Chat request body.
#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OllamaMessage<'a>>,
    pub stream: bool,
}

/// Error body returned by Ollama on failure.
#[derive(Debug, Clone, Deserialize)]
pub struct OllamaError {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_core::Role;

    #[test]
    fn test_request_shape() {
        let messages = vec![
            ChatMessage::system("be brief"),
            ChatMessage::new(Role::AssistantReasoning, "thinking"),
        ];
        let request = ChatRequest {
            model: "llama3:8b",
            messages: messages.iter().map(OllamaMessage::from).collect(),
            stream: true,
        };

        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "llama3:8b");
        assert_eq!(value["stream"], true);
        assert_eq!(value["messages"][1]["role"], "assistant");
    }

    #[test]
    fn test_error_body() {
        let err: OllamaError = serde_json::from_str(r#"{"error":"model 'x' not found"}"#).unwrap();
        assert_eq!(err.error, "model 'x' not found");
    }
}
