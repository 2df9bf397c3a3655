//! The reasoning pipe: initial reasoning, chain-of-thought refinement and a
//! final answer, streamed to the host as they are generated.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use backend_core::{ChatMessage, CompletionResponse, Role, User};
use serde_json::Value;
use tokio::time::sleep;
use tracing::{info, warn};

use crate::adapter::{BackendRouter, StepRole};
use crate::config::PipeConfig;
use crate::discovery::{self, PipeDescriptor};
use crate::emitter::EventEmitter;
use crate::error::PipeError;
use crate::prompts;
use crate::reporter::Reporter;
use crate::step::StepRunner;

/// Returned by task calls when the backend answer has no content.
pub const NO_CONTENT_PLACEHOLDER: &str = "**No content available**";

/// One invocation of the pipe.
#[derive(Debug, Clone, Default)]
pub struct PipeRequest {
    /// The conversation so far; the last user message is the query.
    pub messages: Vec<ChatMessage>,
    /// The acting user, forwarded to the backends.
    pub user: Option<User>,
    /// Set by hosts for auxiliary calls (titles, tags). Skips reasoning.
    pub task: Option<String>,
}

impl PipeRequest {
    pub fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            ..Default::default()
        }
    }

    /// Attach the acting user.
    pub fn with_user(mut self, user: Option<User>) -> Self {
        self.user = user;
        self
    }

    /// Mark this as an auxiliary task call.
    pub fn with_task(mut self, task: impl Into<String>) -> Self {
        self.task = Some(task.into());
        self
    }
}

/// Stage of a full (non-task) invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    InitialReasoning,
    ChainOfThought { iteration: usize },
    FinalResponse,
    Done,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::InitialReasoning => f.write_str("initial reasoning"),
            Stage::ChainOfThought { iteration } => {
                write!(f, "chain-of-thought iteration {}", iteration)
            }
            Stage::FinalResponse => f.write_str("final response"),
            Stage::Done => f.write_str("done"),
        }
    }
}

/// A configured reasoning pipe.
///
/// Cheap to share: the configuration and backends are held behind `Arc`s and
/// every invocation keeps its own state.
#[derive(Debug, Clone)]
pub struct ReasoningPipe {
    config: Arc<PipeConfig>,
    router: BackendRouter,
}

impl ReasoningPipe {
    /// Create a pipe. `router` should be built from the same configuration.
    pub fn new(config: Arc<PipeConfig>, router: BackendRouter) -> Self {
        Self { config, router }
    }

    /// Create a pipe with configuration and backends taken from the
    /// environment.
    pub fn from_env() -> Result<Self, PipeError> {
        let config = Arc::new(PipeConfig::from_env());
        let router = BackendRouter::from_env(config.clone())?;
        Ok(Self::new(config, router))
    }

    pub fn config(&self) -> &PipeConfig {
        &self.config
    }

    pub fn router(&self) -> &BackendRouter {
        &self.router
    }

    /// Descriptors of the pipes this instance exposes.
    pub fn pipes(&self) -> Vec<PipeDescriptor> {
        discovery::pipes(&self.config)
    }

    /// Run one invocation and return the final answer.
    ///
    /// Backend failures are reported through `emitter` and never abort the
    /// run; an error is returned only when `emitter` itself fails.
    pub async fn run(
        &self,
        request: PipeRequest,
        emitter: &dyn EventEmitter,
    ) -> Result<String, PipeError> {
        let query = last_user_message(&request.messages).unwrap_or_default();

        if let Some(task) = request.task.as_deref() {
            info!(task, "Running task completion");
            let reporter = Reporter::new(emitter, self.config.show_reasoning_trace);
            return self.complete_task(&request, &reporter).await;
        }

        let started = Instant::now();
        let mut runner = StepRunner::new(
            &self.router,
            &self.config,
            emitter,
            request.user.as_ref(),
        );

        let mut initial = Vec::with_capacity(self.config.reasoning_models.len());
        for model in &self.config.reasoning_models {
            info!(model = %model, stage = %Stage::InitialReasoning, "Entering stage");
            let reasoning = runner
                .run_step(
                    model,
                    &request.messages,
                    &prompts::initial_reasoning(&query),
                    StepRole::Reasoning,
                    "Initial Reasoning",
                    "Initial Reasoning",
                )
                .await?;
            runner.reporter().set_status("Completed initial reasoning").await?;
            self.pause().await;
            initial.push(reasoning);
        }

        let mut chains = Vec::with_capacity(initial.len());
        for (model, reasoning) in self.config.reasoning_models.iter().zip(initial) {
            let mut chain = vec![reasoning];
            for iteration in 1..=self.config.cot_iterations {
                let stage = Stage::ChainOfThought { iteration };
                info!(model = %model, stage = %stage, "Entering stage");
                let prompt = prompts::chain_of_thought(&chain.join("\n"), &query, iteration);
                let output = runner
                    .run_step(
                        model,
                        &request.messages,
                        &prompt,
                        StepRole::Reasoning,
                        &format!("Chain-of-Thought Iteration {}", iteration),
                        &format!("Iteration {}", iteration),
                    )
                    .await?;
                chain.push(output);
                runner
                    .reporter()
                    .set_status(&format!("Completed chain-of-thought iteration {}", iteration))
                    .await?;
                self.pause().await;
            }
            chains.push(chain.join("\n"));
        }

        info!(model = %self.config.responding_model, stage = %Stage::FinalResponse, "Entering stage");
        runner.reporter().set_status("Generating final response...").await?;
        let answer = runner
            .run_step(
                &self.config.responding_model,
                &request.messages,
                &prompts::final_response(&chains.join("\n\n"), &query),
                StepRole::Responding,
                "Generating final response",
                "Final Response",
            )
            .await?;
        self.pause().await;

        let totals = runner.totals();
        let seconds = started.elapsed().as_secs();
        let summary = if totals.deadline_exceeded {
            format!(
                "Reasoned with {} tokens in max time {}s",
                totals.reasoning_fragments, seconds
            )
        } else {
            format!(
                "Reasoned with {} tokens in {}s",
                totals.reasoning_fragments, seconds
            )
        };
        runner.reporter().set_status_end(&summary).await?;

        info!(
            stage = %Stage::Done,
            fragments = totals.reasoning_fragments,
            deadline_exceeded = totals.deadline_exceeded,
            seconds,
            "Pipe finished"
        );

        Ok(answer)
    }

    async fn complete_task(
        &self,
        request: &PipeRequest,
        reporter: &Reporter<'_>,
    ) -> Result<String, PipeError> {
        let model = self.config.responding_model.trim();
        let response = self
            .router
            .request(
                model,
                request.messages.clone(),
                StepRole::Responding,
                false,
                request.user.as_ref(),
            )
            .await
            .and_then(CompletionResponse::into_json);

        match response {
            Ok(body) => {
                Ok(extract_content(&body).unwrap_or_else(|| NO_CONTENT_PLACEHOLDER.to_string()))
            }
            Err(e) => {
                warn!(model, error = %e, "Task completion failed");
                reporter
                    .set_status_end(&format!("Error: Is {} a valid model? ({})", model, e))
                    .await?;
                Ok(String::new())
            }
        }
    }

    async fn pause(&self) {
        if !self.config.step_pause.is_zero() {
            sleep(self.config.step_pause).await;
        }
    }
}

/// Content of the last message with role `user`.
pub fn last_user_message(messages: &[ChatMessage]) -> Option<String> {
    messages
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.clone())
}

/// Answer text of a non-streaming completion body.
///
/// Accepts the OpenAI shape (`choices[0].message.content`) and the Ollama
/// shape (`message.content`).
pub fn extract_content(body: &Value) -> Option<String> {
    let openai = body
        .get("choices")
        .and_then(Value::as_array)
        .and_then(|choices| choices.first())
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(Value::as_str);

    let ollama = || {
        body.get("message")
            .and_then(|message| message.get("content"))
            .and_then(Value::as_str)
    };

    openai.or_else(ollama).map(str::to_string)
}
