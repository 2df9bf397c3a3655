//! Conversation and request types shared by every backend.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::BackendError;
use crate::stream::ByteStream;

/// Author of a conversation message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    System,
    User,
    Assistant,
    /// Intermediate chain-of-thought text shown in the host's reasoning pane.
    AssistantReasoning,
}

impl Role {
    /// Wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::AssistantReasoning => "assistant-reasoning",
        }
    }

    /// Role name understood by model servers, which have no reasoning role.
    pub fn api_name(&self) -> &'static str {
        match self {
            Role::AssistantReasoning => "assistant",
            other => other.as_str(),
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Who wrote the message.
    pub role: Role,
    /// Message text.
    pub content: String,
}

impl ChatMessage {
    /// Create a message with an explicit role.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// The acting user the host invokes the pipe on behalf of.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub role: String,
}

/// A chat completion call: model id, message list, stream flag, acting user.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
    pub user: Option<User>,
}

impl CompletionRequest {
    /// Create a non-streaming request.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self {
            model: model.into(),
            messages,
            stream: false,
            user: None,
        }
    }

    /// Set the stream flag.
    pub fn streaming(mut self, stream: bool) -> Self {
        self.stream = stream;
        self
    }

    /// Attach the acting user.
    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }
}

/// What a backend hands back: a materialized JSON body or a live byte stream.
#[derive(Debug)]
pub enum CompletionResponse {
    Json(Value),
    Stream(ByteStream),
}

impl CompletionResponse {
    /// Unwrap a streaming response.
    pub fn into_stream(self) -> Result<ByteStream, BackendError> {
        match self {
            CompletionResponse::Stream(stream) => Ok(stream),
            CompletionResponse::Json(_) => Err(BackendError::InvalidResponse(
                "expected a streaming response, got a JSON body".to_string(),
            )),
        }
    }

    /// Unwrap a JSON response. A stream handed back instead is closed on drop.
    pub fn into_json(self) -> Result<Value, BackendError> {
        match self {
            CompletionResponse::Json(value) => Ok(value),
            CompletionResponse::Stream(_) => Err(BackendError::InvalidResponse(
                "expected a JSON body, got a stream".to_string(),
            )),
        }
    }
}
