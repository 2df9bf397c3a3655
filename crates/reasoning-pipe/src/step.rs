//! One prompt-and-stream step of the pipeline.

use std::time::Instant;

use backend_core::{BackendError, ChatMessage, CompletionResponse, User};
use tracing::{debug, info, warn};

use crate::adapter::{BackendRouter, StepRole};
use crate::config::PipeConfig;
use crate::decoder::LineDecoder;
use crate::emitter::EventEmitter;
use crate::error::PipeError;
use crate::reporter::Reporter;

/// Maximum bytes read from a stream per iteration.
pub const READ_CHUNK_SIZE: usize = 1024;

/// Counters accumulated over one invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    /// Fragments streamed by reasoning steps.
    pub reasoning_fragments: usize,
    /// Set once any reasoning step ran out of time.
    pub deadline_exceeded: bool,
}

/// Runs steps for a single invocation and tracks its totals.
pub struct StepRunner<'a> {
    router: &'a BackendRouter,
    config: &'a PipeConfig,
    reporter: Reporter<'a>,
    user: Option<&'a User>,
    totals: RunTotals,
}

/// Text and fragment count streamed by one step.
#[derive(Debug, Default)]
struct StepOutput {
    text: String,
    fragments: usize,
}

impl<'a> StepRunner<'a> {
    pub fn new(
        router: &'a BackendRouter,
        config: &'a PipeConfig,
        emitter: &'a dyn EventEmitter,
        user: Option<&'a User>,
    ) -> Self {
        Self {
            router,
            config,
            reporter: Reporter::new(emitter, config.show_reasoning_trace),
            user,
            totals: RunTotals::default(),
        }
    }

    /// Totals so far.
    pub fn totals(&self) -> RunTotals {
        self.totals
    }

    /// Reporter bound to this invocation's emitter.
    pub fn reporter(&self) -> &Reporter<'a> {
        &self.reporter
    }

    /// Run one step and return its trimmed output.
    ///
    /// The last message of `messages` is replaced by `prompt` for this call
    /// only. Every fragment is forwarded to the host together with a
    /// `"{step_label} ({n} tokens)"` status. Backend failures end the step
    /// with a terminal status and whatever text arrived before them; only
    /// emitter failures are returned as errors.
    pub async fn run_step(
        &mut self,
        model: &str,
        messages: &[ChatMessage],
        prompt: &str,
        role: StepRole,
        step_label: &str,
        title_label: &str,
    ) -> Result<String, PipeError> {
        let model = model.trim();
        let conversation = with_prompt(messages, prompt);

        self.reporter
            .send_data(&format!("\n### {}\n", title_label), role.is_reasoning())
            .await?;

        let mut output = StepOutput::default();
        let streamed = self
            .stream_step(model, conversation, role, step_label, &mut output)
            .await;

        if role.is_reasoning() {
            self.totals.reasoning_fragments += output.fragments;
        }
        streamed?;

        debug!(
            model,
            step = step_label,
            fragments = output.fragments,
            "Step finished"
        );

        Ok(output.text.trim().to_string())
    }

    async fn stream_step(
        &mut self,
        model: &str,
        conversation: Vec<ChatMessage>,
        role: StepRole,
        step_label: &str,
        output: &mut StepOutput,
    ) -> Result<(), PipeError> {
        let started = Instant::now();
        let is_reasoning = role.is_reasoning();

        let opened = self
            .router
            .request(model, conversation, role, true, self.user)
            .await
            .and_then(CompletionResponse::into_stream);
        let mut stream = match opened {
            Ok(stream) => stream,
            Err(e) => return self.report_failure(model, role, &e).await,
        };

        let mut decoder = LineDecoder::new();
        loop {
            let chunk = match stream.read(READ_CHUNK_SIZE).await {
                Ok(Some(chunk)) => chunk,
                Ok(None) => break,
                Err(e) => {
                    stream.close();
                    return self.report_failure(model, role, &e).await;
                }
            };

            for fragment in decoder.feed(&chunk) {
                output.text.push_str(&fragment);
                output.fragments += 1;
                self.reporter.send_data(&fragment, is_reasoning).await?;
                self.reporter
                    .set_status(&format!("{} ({} tokens)", step_label, output.fragments))
                    .await?;
            }

            if is_reasoning && started.elapsed() >= self.config.max_reasoning_time {
                info!(model, step = step_label, "Max reasoning time reached");
                self.totals.deadline_exceeded = true;
                break;
            }
        }

        stream.close();
        Ok(())
    }

    async fn report_failure(
        &self,
        model: &str,
        role: StepRole,
        error: &BackendError,
    ) -> Result<(), PipeError> {
        let kind = self.router.kind_for(role);
        warn!(model, backend = %kind, error = %error, "{} step failed", role.label());

        self.reporter
            .set_status_end(&format!(
                "{} Error: Invalid model {} in {} API ({})",
                role.label(),
                model,
                kind.api_name(),
                error
            ))
            .await
    }
}

/// Copy of `messages` whose last entry is replaced by the prompt.
fn with_prompt(messages: &[ChatMessage], prompt: &str) -> Vec<ChatMessage> {
    let mut conversation = messages.to_vec();
    let prompt = ChatMessage::user(prompt);
    match conversation.last_mut() {
        Some(last) => *last = prompt,
        None => conversation.push(prompt),
    }
    conversation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emitter::CollectingEmitter;
    use crate::events::PipeEvent;
    use backend_core::{Role, StreamLine};
    use mock_backend::{MockReply, ScriptedBackend};
    use std::sync::Arc;
    use std::time::Duration;

    fn line(content: &str) -> String {
        StreamLine::content(content).to_line()
    }

    fn setup(
        config: PipeConfig,
        ollama: ScriptedBackend,
    ) -> (Arc<ScriptedBackend>, BackendRouter, PipeConfig) {
        let ollama = Arc::new(ollama);
        let router = BackendRouter::new(
            ScriptedBackend::new("OpenAI"),
            ollama.clone(),
            Arc::new(config.clone()),
        );
        (ollama, router, config)
    }

    #[test]
    fn test_with_prompt_replaces_last() {
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("original")];
        let conversation = with_prompt(&messages, "prompt");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation[1], ChatMessage::user("prompt"));
        assert_eq!(messages[1].content, "original");
        assert_eq!(with_prompt(&[], "p"), vec![ChatMessage::user("p")]);
    }

    #[tokio::test]
    async fn test_step_streams_fragments_and_statuses() {
        let config = PipeConfig::builder().show_reasoning_trace(true).build();
        let (ollama, router, config) = setup(
            config,
            ScriptedBackend::new("Ollama").with_reply(MockReply::fragments(["  Hel", "lo  "])),
        );
        let emitter = CollectingEmitter::new();
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        let text = runner
            .run_step(
                " m1 ",
                &[ChatMessage::user("q")],
                "P",
                StepRole::Reasoning,
                "Initial Reasoning",
                "Initial Reasoning",
            )
            .await
            .unwrap();

        assert_eq!(text, "Hello");
        assert_eq!(runner.totals().reasoning_fragments, 2);
        assert_eq!(
            emitter.events().await,
            vec![
                PipeEvent::message("\n### Initial Reasoning\n", Role::AssistantReasoning),
                PipeEvent::message("  Hel", Role::AssistantReasoning),
                PipeEvent::status("Initial Reasoning (1 tokens)"),
                PipeEvent::message("lo  ", Role::AssistantReasoning),
                PipeEvent::status("Initial Reasoning (2 tokens)"),
            ]
        );

        let sent = ollama.requests().await;
        assert_eq!(sent[0].model, "m1");
        assert!(sent[0].stream);
        assert_eq!(sent[0].messages, vec![ChatMessage::user("P")]);
        assert_eq!(ollama.streams_closed(), 1);
    }

    #[tokio::test]
    async fn test_responding_fragments_do_not_count() {
        let (_, router, config) = setup(
            PipeConfig::default(),
            ScriptedBackend::new("Ollama").with_reply(MockReply::fragments(["a", "b"])),
        );
        let emitter = CollectingEmitter::new();
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        let text = runner
            .run_step("r", &[], "P", StepRole::Responding, "Generating final response", "Final Response")
            .await
            .unwrap();

        assert_eq!(text, "ab");
        assert_eq!(runner.totals(), RunTotals::default());
        assert_eq!(emitter.text(Role::Assistant).await, "\n### Final Response\nab");
    }

    #[tokio::test]
    async fn test_open_failure_names_backend_used() {
        let config = PipeConfig::builder()
            .use_openai_api_responding_model(true)
            .build();
        let router = BackendRouter::new(
            ScriptedBackend::new("OpenAI").with_reply(MockReply::Fail("refused".into())),
            ScriptedBackend::new("Ollama"),
            Arc::new(config.clone()),
        );
        let emitter = CollectingEmitter::new();
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        let text = runner
            .run_step("gpt-x", &[], "P", StepRole::Responding, "s", "t")
            .await
            .unwrap();

        assert_eq!(text, "");
        assert_eq!(
            emitter.last_terminal().await.unwrap(),
            "Responding Error: Invalid model gpt-x in OpenAI API (network error: refused)"
        );
    }

    #[tokio::test]
    async fn test_read_failure_keeps_partial_text_and_closes() {
        let (ollama, router, config) = setup(
            PipeConfig::default(),
            ScriptedBackend::new("Ollama").with_reply(MockReply::BrokenStream {
                frames: vec![line("part").into()],
                error: "reset".into(),
            }),
        );
        let emitter = CollectingEmitter::new();
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        let text = runner
            .run_step("m", &[], "P", StepRole::Reasoning, "s", "t")
            .await
            .unwrap();

        assert_eq!(text, "part");
        assert_eq!(runner.totals().reasoning_fragments, 1);
        assert!(emitter
            .last_terminal()
            .await
            .unwrap()
            .starts_with("Reasoning Error: Invalid model m in Ollama API ("));
        assert_eq!(ollama.streams_closed(), 1);
    }

    #[tokio::test]
    async fn test_zero_budget_stops_after_first_chunk() {
        let config = PipeConfig::builder()
            .max_reasoning_time(Duration::ZERO)
            .build();
        let (ollama, router, config) = setup(
            config,
            ScriptedBackend::new("Ollama").with_reply(MockReply::fragments(["one", "two", "three"])),
        );
        let emitter = CollectingEmitter::new();
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        let text = runner
            .run_step("m", &[], "P", StepRole::Reasoning, "s", "t")
            .await
            .unwrap();

        assert_eq!(text, "one");
        assert!(runner.totals().deadline_exceeded);
        assert_eq!(ollama.streams_closed(), 1);
    }

    #[tokio::test]
    async fn test_emitter_failure_propagates_and_closes() {
        let (ollama, router, config) = setup(
            PipeConfig::default(),
            ScriptedBackend::new("Ollama").with_reply(MockReply::fragments(["a"])),
        );
        let (emitter, rx) = crate::emitter::ChannelEmitter::new(1);
        drop(rx);
        let mut runner = StepRunner::new(&router, &config, &emitter, None);

        // Hidden reasoning text is never emitted, so the first status fails.
        let err = runner
            .run_step("m", &[], "P", StepRole::Reasoning, "s", "t")
            .await
            .unwrap_err();

        assert!(matches!(err, PipeError::Emit(_)));
        assert_eq!(ollama.streams_opened(), 1);
        assert_eq!(ollama.streams_closed(), 1);
    }
}
