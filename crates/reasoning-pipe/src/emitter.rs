//! Event emitter trait and implementations.

use async_trait::async_trait;
use backend_core::Role;
use tokio::sync::{mpsc, Mutex};

use crate::error::PipeError;
use crate::events::PipeEvent;

/// Trait for delivering pipe events to the host.
///
/// Abstracted to support different hosts (HTTP streaming, logs, tests).
/// An error aborts the invocation.
#[async_trait]
pub trait EventEmitter: Send + Sync {
    /// Deliver one event.
    async fn emit(&self, event: PipeEvent) -> Result<(), PipeError>;
}

/// An emitter that discards every event.
#[derive(Debug, Clone, Default)]
pub struct NoOpEmitter;

#[async_trait]
impl EventEmitter for NoOpEmitter {
    async fn emit(&self, _event: PipeEvent) -> Result<(), PipeError> {
        Ok(())
    }
}

/// An emitter that writes events to the log.
///
/// Statuses log at `info`, message fragments at `debug`.
#[derive(Debug, Clone, Default)]
pub struct LoggingEmitter;

#[async_trait]
impl EventEmitter for LoggingEmitter {
    async fn emit(&self, event: PipeEvent) -> Result<(), PipeError> {
        match event {
            PipeEvent::Status { description, done } => {
                tracing::info!(done, "[status] {}", description);
            }
            PipeEvent::Message { content, role } => {
                tracing::debug!(role = %role, "[message] {}", content);
            }
        }
        Ok(())
    }
}

/// An emitter that keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingEmitter {
    events: Mutex<Vec<PipeEvent>>,
}

impl CollectingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// All events so far, in order.
    pub async fn events(&self) -> Vec<PipeEvent> {
        self.events.lock().await.clone()
    }

    /// Status descriptions so far, in order.
    pub async fn statuses(&self) -> Vec<String> {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                PipeEvent::Status { description, .. } => Some(description.clone()),
                PipeEvent::Message { .. } => None,
            })
            .collect()
    }

    /// Concatenated message text sent with the given role.
    pub async fn text(&self, role: Role) -> String {
        self.events
            .lock()
            .await
            .iter()
            .filter_map(|event| match event {
                PipeEvent::Message { content, role: r } if *r == role => Some(content.as_str()),
                _ => None,
            })
            .collect()
    }

    /// The last terminal status, if any.
    pub async fn last_terminal(&self) -> Option<String> {
        self.events
            .lock()
            .await
            .iter()
            .rev()
            .find_map(|event| match event {
                PipeEvent::Status {
                    description,
                    done: true,
                } => Some(description.clone()),
                _ => None,
            })
    }
}

#[async_trait]
impl EventEmitter for CollectingEmitter {
    async fn emit(&self, event: PipeEvent) -> Result<(), PipeError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}

/// An emitter that forwards events over a bounded channel.
///
/// Fails once the receiving side is gone, which stops the invocation.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::Sender<PipeEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver its events arrive on.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<PipeEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }
}

#[async_trait]
impl EventEmitter for ChannelEmitter {
    async fn emit(&self, event: PipeEvent) -> Result<(), PipeError> {
        self.tx
            .send(event)
            .await
            .map_err(|_| PipeError::Emit("event receiver dropped".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_noop_and_logging_emitters() {
        NoOpEmitter.emit(PipeEvent::status("x")).await.unwrap();
        LoggingEmitter.emit(PipeEvent::status_done("x")).await.unwrap();
        LoggingEmitter
            .emit(PipeEvent::message("y", Role::Assistant))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_collecting_emitter() {
        let emitter = CollectingEmitter::new();
        emitter.emit(PipeEvent::status("working")).await.unwrap();
        emitter
            .emit(PipeEvent::message("a", Role::AssistantReasoning))
            .await
            .unwrap();
        emitter.emit(PipeEvent::message("b", Role::Assistant)).await.unwrap();
        emitter.emit(PipeEvent::status_done("finished")).await.unwrap();

        assert_eq!(emitter.events().await.len(), 4);
        assert_eq!(emitter.statuses().await, vec!["working", "finished"]);
        assert_eq!(emitter.text(Role::AssistantReasoning).await, "a");
        assert_eq!(emitter.text(Role::Assistant).await, "b");
        assert_eq!(emitter.last_terminal().await.as_deref(), Some("finished"));
    }

    #[tokio::test]
    async fn test_channel_emitter_forwards() {
        let (emitter, mut rx) = ChannelEmitter::new(4);
        emitter.emit(PipeEvent::status("one")).await.unwrap();

        assert_eq!(rx.recv().await, Some(PipeEvent::status("one")));
    }

    #[tokio::test]
    async fn test_channel_emitter_fails_without_receiver() {
        let (emitter, rx) = ChannelEmitter::new(1);
        drop(rx);

        let err = emitter.emit(PipeEvent::status("lost")).await.unwrap_err();
        assert!(matches!(err, PipeError::Emit(_)));
    }
}
