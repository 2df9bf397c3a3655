//! Thin helper that turns step progress into pipe events.

use backend_core::Role;

use crate::emitter::EventEmitter;
use crate::error::PipeError;
use crate::events::PipeEvent;

/// Reports progress for one invocation.
pub struct Reporter<'a> {
    emitter: &'a dyn EventEmitter,
    show_reasoning_trace: bool,
}

impl<'a> Reporter<'a> {
    pub fn new(emitter: &'a dyn EventEmitter, show_reasoning_trace: bool) -> Self {
        Self {
            emitter,
            show_reasoning_trace,
        }
    }

    /// Emit an in-progress status.
    pub async fn set_status(&self, description: &str) -> Result<(), PipeError> {
        self.emitter.emit(PipeEvent::status(description)).await
    }

    /// Emit a terminal status.
    pub async fn set_status_end(&self, description: &str) -> Result<(), PipeError> {
        self.emitter.emit(PipeEvent::status_done(description)).await
    }

    /// Emit message text. Reasoning text is dropped unless the trace is shown.
    pub async fn send_data(&self, data: &str, reasoning: bool) -> Result<(), PipeError> {
        if reasoning && !self.show_reasoning_trace {
            return Ok(());
        }

        let role = if reasoning {
            Role::AssistantReasoning
        } else {
            Role::Assistant
        };
        self.emitter.emit(PipeEvent::message(data, role)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::CollectingEmitter;

    #[tokio::test]
    async fn test_reasoning_hidden_without_trace() {
        let emitter = CollectingEmitter::new();
        let reporter = Reporter::new(&emitter, false);

        reporter.send_data("thinking", true).await.unwrap();
        reporter.send_data("answer", false).await.unwrap();

        assert_eq!(
            emitter.events().await,
            vec![PipeEvent::message("answer", Role::Assistant)]
        );
    }

    #[tokio::test]
    async fn test_reasoning_shown_with_trace() {
        let emitter = CollectingEmitter::new();
        let reporter = Reporter::new(&emitter, true);

        reporter.send_data("thinking", true).await.unwrap();
        reporter.set_status("busy").await.unwrap();
        reporter.set_status_end("done").await.unwrap();

        assert_eq!(
            emitter.events().await,
            vec![
                PipeEvent::message("thinking", Role::AssistantReasoning),
                PipeEvent::status("busy"),
                PipeEvent::status_done("done"),
            ]
        );
    }
}
