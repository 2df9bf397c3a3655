//! Configuration for the reasoning pipe.

use std::env;
use std::time::Duration;

use crate::adapter::{BackendKind, StepRole};

/// Placeholder shipped as the default reasoning model.
pub const DEFAULT_REASONING_MODEL: &str = "your_reasoning_model_id_here";

/// Placeholder shipped as the default responding model.
pub const DEFAULT_RESPONDING_MODEL: &str = "your_responding_model_id_here";

/// Default reasoning budget in seconds.
pub const DEFAULT_MAX_REASONING_SECS: u64 = 120;

/// Default number of chain-of-thought refinements.
pub const DEFAULT_COT_ITERATIONS: usize = 3;

/// Default pause between steps in milliseconds.
pub const DEFAULT_STEP_PAUSE_MS: u64 = 200;

/// Configuration for one pipe instance.
///
/// Resolved once and shared read-only by every invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipeConfig {
    /// Reasoning model ids, in the order they run.
    pub reasoning_models: Vec<String>,

    /// Route reasoning steps to the OpenAI-compatible backend.
    pub use_openai_api_reasoning_model: bool,

    /// Model id used for the final answer and for task calls.
    pub responding_model: String,

    /// Route responding steps to the OpenAI-compatible backend.
    pub use_openai_api_responding_model: bool,

    /// Forward reasoning text to the host.
    pub show_reasoning_trace: bool,

    /// Wall-clock budget for each reasoning step.
    pub max_reasoning_time: Duration,

    /// Chain-of-thought refinements per reasoning model.
    pub cot_iterations: usize,

    /// Pause after every step.
    pub step_pause: Duration,
}

impl Default for PipeConfig {
    fn default() -> Self {
        Self {
            reasoning_models: vec![DEFAULT_REASONING_MODEL.to_string()],
            use_openai_api_reasoning_model: false,
            responding_model: DEFAULT_RESPONDING_MODEL.to_string(),
            use_openai_api_responding_model: false,
            show_reasoning_trace: false,
            max_reasoning_time: Duration::from_secs(DEFAULT_MAX_REASONING_SECS),
            cot_iterations: DEFAULT_COT_ITERATIONS,
            step_pause: Duration::from_millis(DEFAULT_STEP_PAUSE_MS),
        }
    }
}

impl PipeConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `REASONING_MODEL` - Comma-separated model ids (default: your_reasoning_model_id_here)
    /// - `USE_OPENAI_API_REASONING_MODEL` - Use the OpenAI API for reasoning (default: false)
    /// - `RESPONDING_MODEL` - Model id for the final answer (default: your_responding_model_id_here)
    /// - `USE_OPENAI_API_RESPONDING_MODEL` - Use the OpenAI API for answering (default: false)
    /// - `ENABLE_SHOW_REASONING_TRACE` - Forward reasoning text (default: false)
    /// - `MAX_REASONING_TIME` - Reasoning budget in seconds (default: 120)
    /// - `COT_ITERATIONS` - Chain-of-thought refinements (default: 3)
    /// - `PIPE_STEP_PAUSE_MS` - Pause after each step (default: 200)
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let reasoning_models = env::var("REASONING_MODEL")
            .map(|v| parse_model_list(&v))
            .unwrap_or_else(|_| vec![DEFAULT_REASONING_MODEL.to_string()]);

        let responding_model = env::var("RESPONDING_MODEL")
            .map(|v| v.trim().to_string())
            .unwrap_or_else(|_| DEFAULT_RESPONDING_MODEL.to_string());

        let max_reasoning_time = env::var("MAX_REASONING_TIME")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_MAX_REASONING_SECS));

        let cot_iterations = env::var("COT_ITERATIONS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(DEFAULT_COT_ITERATIONS);

        let step_pause = env::var("PIPE_STEP_PAUSE_MS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_millis(DEFAULT_STEP_PAUSE_MS));

        if reasoning_models.is_empty() {
            tracing::warn!("REASONING_MODEL lists no models; only the final response will run");
        }

        Self {
            reasoning_models,
            use_openai_api_reasoning_model: env_flag("USE_OPENAI_API_REASONING_MODEL"),
            responding_model,
            use_openai_api_responding_model: env_flag("USE_OPENAI_API_RESPONDING_MODEL"),
            show_reasoning_trace: env_flag("ENABLE_SHOW_REASONING_TRACE"),
            max_reasoning_time,
            cot_iterations,
            step_pause,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> PipeConfigBuilder {
        PipeConfigBuilder::default()
    }

    /// Backend a step of the given role is sent to.
    pub fn backend_for(&self, role: StepRole) -> BackendKind {
        let use_openai = match role {
            StepRole::Reasoning => self.use_openai_api_reasoning_model,
            StepRole::Responding => self.use_openai_api_responding_model,
        };
        BackendKind::from_flag(use_openai)
    }
}

/// Builder for PipeConfig.
#[derive(Debug, Default)]
pub struct PipeConfigBuilder {
    config: PipeConfig,
}

impl PipeConfigBuilder {
    /// Set the reasoning models.
    pub fn reasoning_models<I, S>(mut self, models: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.reasoning_models = models
            .into_iter()
            .map(|m| m.as_ref().trim().to_string())
            .filter(|m| !m.is_empty())
            .collect();
        self
    }

    /// Set the responding model.
    pub fn responding_model(mut self, model: impl Into<String>) -> Self {
        self.config.responding_model = model.into().trim().to_string();
        self
    }

    /// Route reasoning steps to the OpenAI-compatible backend.
    pub fn use_openai_api_reasoning_model(mut self, enable: bool) -> Self {
        self.config.use_openai_api_reasoning_model = enable;
        self
    }

    /// Route responding steps to the OpenAI-compatible backend.
    pub fn use_openai_api_responding_model(mut self, enable: bool) -> Self {
        self.config.use_openai_api_responding_model = enable;
        self
    }

    /// Forward reasoning text to the host.
    pub fn show_reasoning_trace(mut self, enable: bool) -> Self {
        self.config.show_reasoning_trace = enable;
        self
    }

    /// Set the reasoning budget.
    pub fn max_reasoning_time(mut self, budget: Duration) -> Self {
        self.config.max_reasoning_time = budget;
        self
    }

    /// Set the number of chain-of-thought refinements.
    pub fn cot_iterations(mut self, iterations: usize) -> Self {
        self.config.cot_iterations = iterations;
        self
    }

    /// Set the pause after each step.
    pub fn step_pause(mut self, pause: Duration) -> Self {
        self.config.step_pause = pause;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> PipeConfig {
        self.config
    }
}

/// Split a comma-separated model list, dropping blank entries.
pub fn parse_model_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(str::to_string)
        .collect()
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let v = v.trim();
            v.eq_ignore_ascii_case("true") || v == "1"
        })
        .unwrap_or(false)
}
