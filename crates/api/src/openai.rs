//! OpenAI-compatible wire types and their mapping to pipe types.

use std::time::{SystemTime, UNIX_EPOCH};

use axum::response::sse::Event;
use backend_core::{ChatMessage as PipeMessage, Role, User};
use reasoning_pipe::{PipeDescriptor, PipeEvent, PipeRequest};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct ChatCompletionRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default)]
    pub stream: bool,
    /// Auxiliary host task (title or tag generation). Skips reasoning.
    #[serde(default)]
    pub task: Option<String>,
    #[serde(default)]
    pub user: Option<UserField>,
}

#[derive(Debug, Deserialize)]
pub struct ChatMessage {
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub content: Value,
}

/// `user` as sent by plain OpenAI clients (an id) or by chat hosts (an object).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum UserField {
    Id(String),
    Full(User),
}

impl From<UserField> for User {
    fn from(field: UserField) -> Self {
        match field {
            UserField::Id(id) => User {
                id,
                ..Default::default()
            },
            UserField::Full(user) => user,
        }
    }
}

impl ChatCompletionRequest {
    /// Convert into a pipe invocation, dropping messages with unknown roles.
    pub fn into_pipe_request(self) -> PipeRequest {
        let messages = self
            .messages
            .iter()
            .filter_map(|msg| {
                let role = parse_role(&msg.role)?;
                Some(PipeMessage::new(role, extract_text(&msg.content).unwrap_or_default()))
            })
            .collect();

        PipeRequest {
            messages,
            user: self.user.map(User::from),
            task: self.task.filter(|t| !t.trim().is_empty()),
        }
    }
}

fn parse_role(role: &str) -> Option<Role> {
    match role {
        "system" | "developer" => Some(Role::System),
        "user" => Some(Role::User),
        "assistant" => Some(Role::Assistant),
        "assistant-reasoning" => Some(Role::AssistantReasoning),
        _ => None,
    }
}

/// Text of a message content: a plain string or an array of text parts.
pub fn extract_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Array(items) => {
            let parts: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("text").and_then(|t| t.as_str()))
                .collect();
            if parts.is_empty() {
                None
            } else {
                Some(parts.join(""))
            }
        }
        _ => None,
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionResponse {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoice>,
    pub usage: Usage,
}

#[derive(Debug, Serialize)]
pub struct ChatChoice {
    pub index: u32,
    pub message: ChatMessageResponse,
    pub finish_reason: String,
}

#[derive(Debug, Serialize)]
pub struct ChatMessageResponse {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Default, Serialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

impl ChatCompletionResponse {
    pub fn new(model: String, content: String) -> Self {
        Self {
            id: completion_id(),
            object: "chat.completion".to_string(),
            created: unix_timestamp(),
            model,
            choices: vec![ChatChoice {
                index: 0,
                message: ChatMessageResponse {
                    role: "assistant".to_string(),
                    content,
                },
                finish_reason: "stop".to_string(),
            }],
            usage: Usage::default(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionChunk {
    pub id: String,
    pub object: String,
    pub created: u64,
    pub model: String,
    pub choices: Vec<ChatChoiceChunk>,
}

#[derive(Debug, Serialize)]
pub struct ChatChoiceChunk {
    pub index: u32,
    pub delta: Value,
    pub finish_reason: Option<String>,
}

/// Builds the chunks of one streamed completion under a shared id.
#[derive(Debug, Clone)]
pub struct ChunkFactory {
    id: String,
    created: u64,
    model: String,
}

impl ChunkFactory {
    pub fn new(model: String) -> Self {
        Self {
            id: completion_id(),
            created: unix_timestamp(),
            model,
        }
    }

    pub fn chunk(&self, delta: Value, finish_reason: Option<&str>) -> ChatCompletionChunk {
        ChatCompletionChunk {
            id: self.id.clone(),
            object: "chat.completion.chunk".to_string(),
            created: self.created,
            model: self.model.clone(),
            choices: vec![ChatChoiceChunk {
                index: 0,
                delta,
                finish_reason: finish_reason.map(str::to_string),
            }],
        }
    }

    /// Opening chunk announcing the assistant role.
    pub fn start(&self) -> Result<Event, axum::Error> {
        Event::default().json_data(self.chunk(json!({"role": "assistant"}), None))
    }

    /// Closing chunk with `finish_reason: "stop"`.
    pub fn stop(&self) -> Result<Event, axum::Error> {
        Event::default().json_data(self.chunk(json!({}), Some("stop")))
    }

    /// SSE frame for one pipe event.
    ///
    /// Answer text becomes `delta.content`, reasoning text becomes
    /// `delta.reasoning_content`, and statuses are sent as `event: status`.
    pub fn event(&self, event: PipeEvent) -> Result<Event, axum::Error> {
        match event {
            PipeEvent::Message { content, role } => {
                let delta = if role == Role::AssistantReasoning {
                    json!({ "reasoning_content": content })
                } else {
                    json!({ "content": content })
                };
                Event::default().json_data(self.chunk(delta, None))
            }
            PipeEvent::Status { description, done } => Event::default()
                .event("status")
                .json_data(json!({ "description": description, "done": done })),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ModelList {
    pub object: String,
    pub data: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
pub struct ModelInfo {
    pub id: String,
    pub object: String,
    pub owned_by: String,
}

impl ModelList {
    pub fn from_pipes(pipes: Vec<PipeDescriptor>) -> Self {
        Self {
            object: "list".to_string(),
            data: pipes
                .into_iter()
                .map(|pipe| ModelInfo {
                    id: pipe.id,
                    object: "model".to_string(),
                    owned_by: "codemaster".to_string(),
                })
                .collect(),
        }
    }
}

fn completion_id() -> String {
    format!("chatcmpl-{}", Uuid::new_v4())
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
