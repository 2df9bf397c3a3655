//! Line-delimited JSON records streamed by backends.
//!
//! Each line of a streaming body is one standalone JSON object, optionally
//! carrying a `message.content` fragment and a `done` flag marking the end of
//! the turn:
//!
//! ```text
//! {"message":{"role":"assistant","content":"Hel"},"done":false}
//! {"message":{"role":"assistant","content":"lo"},"done":false}
//! {"done":true}
//! ```

use serde::{Deserialize, Serialize};

use crate::message::Role;

/// The message part of a stream line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLineMessage {
    pub role: Role,
    pub content: String,
}

/// One line of a streaming body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<StreamLineMessage>,
    #[serde(default)]
    pub done: bool,
}

impl StreamLine {
    /// A line carrying one assistant text fragment.
    pub fn content(text: impl Into<String>) -> Self {
        Self {
            message: Some(StreamLineMessage {
                role: Role::Assistant,
                content: text.into(),
            }),
            done: false,
        }
    }

    /// The end-of-turn marker.
    pub fn done() -> Self {
        Self {
            message: None,
            done: true,
        }
    }

    /// Serialize as a newline-terminated line.
    pub fn to_line(&self) -> String {
        let mut line = serde_json::to_string(self).unwrap_or_else(|_| "{}".to_string());
        line.push('\n');
        line
    }
}
