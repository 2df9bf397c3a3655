//! Events delivered to the host while a pipe runs.

use backend_core::Role;
use serde::{Deserialize, Serialize};

/// An event pushed to the host.
///
/// Serialized as `{"type": "status", "data": {...}}` or
/// `{"type": "message", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "lowercase")]
pub enum PipeEvent {
    /// Progress line. `done` marks the last status of an invocation or a
    /// failed step.
    Status { description: String, done: bool },

    /// Streamed text for the conversation view.
    Message { content: String, role: Role },
}

impl PipeEvent {
    /// An in-progress status.
    pub fn status(description: impl Into<String>) -> Self {
        PipeEvent::Status {
            description: description.into(),
            done: false,
        }
    }

    /// A terminal status.
    pub fn status_done(description: impl Into<String>) -> Self {
        PipeEvent::Status {
            description: description.into(),
            done: true,
        }
    }

    /// A message fragment.
    pub fn message(content: impl Into<String>, role: Role) -> Self {
        PipeEvent::Message {
            content: content.into(),
            role,
        }
    }

    /// Whether this is a terminal status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipeEvent::Status { done: true, .. })
    }
}
