//! Routes step requests to the configured backend.

use std::fmt;
use std::sync::Arc;

use backend_core::{
    BackendError, ChatMessage, CompletionBackend, CompletionRequest, CompletionResponse, Role,
    User,
};
use ollama_backend::OllamaBackend;
use openai_backend::OpenAiBackend;
use tracing::debug;

use crate::config::PipeConfig;
use crate::error::PipeError;

/// Which half of the pipeline a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepRole {
    Reasoning,
    Responding,
}

impl StepRole {
    pub fn is_reasoning(&self) -> bool {
        matches!(self, StepRole::Reasoning)
    }

    /// Label used in error statuses.
    pub fn label(&self) -> &'static str {
        match self {
            StepRole::Reasoning => "Reasoning",
            StepRole::Responding => "Responding",
        }
    }

    /// Role of the message events this step emits.
    pub fn message_role(&self) -> Role {
        match self {
            StepRole::Reasoning => Role::AssistantReasoning,
            StepRole::Responding => Role::Assistant,
        }
    }
}

/// The two supported backend families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    OpenAi,
    Ollama,
}

impl BackendKind {
    pub fn from_flag(use_openai: bool) -> Self {
        if use_openai {
            BackendKind::OpenAi
        } else {
            BackendKind::Ollama
        }
    }

    /// Name used in status lines.
    pub fn api_name(&self) -> &'static str {
        match self {
            BackendKind::OpenAi => "OpenAI",
            BackendKind::Ollama => "Ollama",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

/// Sends chat requests to the backend configured for each step role.
#[derive(Clone)]
pub struct BackendRouter {
    openai: Arc<dyn CompletionBackend>,
    ollama: Arc<dyn CompletionBackend>,
    config: Arc<PipeConfig>,
}

impl BackendRouter {
    /// Create a router over the given backends.
    pub fn new<O, L>(openai: O, ollama: L, config: Arc<PipeConfig>) -> Self
    where
        O: CompletionBackend + 'static,
        L: CompletionBackend + 'static,
    {
        Self {
            openai: Arc::new(openai),
            ollama: Arc::new(ollama),
            config,
        }
    }

    /// Create a router with the HTTP backends configured from the environment.
    ///
    /// See [`ollama_backend::OllamaBackendConfig::from_env`] and
    /// [`openai_backend::OpenAiBackendConfig::from_env`].
    pub fn from_env(config: Arc<PipeConfig>) -> Result<Self, PipeError> {
        let openai = OpenAiBackend::from_env()?;
        let ollama = OllamaBackend::from_env()?;
        Ok(Self::new(openai, ollama, config))
    }

    /// Backend kind used for steps of the given role.
    pub fn kind_for(&self, role: StepRole) -> BackendKind {
        self.config.backend_for(role)
    }

    /// The backend of the given kind.
    pub fn backend(&self, kind: BackendKind) -> &dyn CompletionBackend {
        match kind {
            BackendKind::OpenAi => self.openai.as_ref(),
            BackendKind::Ollama => self.ollama.as_ref(),
        }
    }

    /// Issue one chat request for a step. No retries.
    pub async fn request(
        &self,
        model: &str,
        messages: Vec<ChatMessage>,
        role: StepRole,
        stream: bool,
        user: Option<&User>,
    ) -> Result<CompletionResponse, BackendError> {
        let kind = self.kind_for(role);
        let backend = self.backend(kind);

        debug!(
            backend = backend.name(),
            model,
            stream,
            messages = messages.len(),
            "{} request",
            role.label()
        );

        let request = CompletionRequest::new(model, messages)
            .streaming(stream)
            .with_user(user.cloned());

        backend.generate(request).await
    }
}

impl fmt::Debug for BackendRouter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendRouter")
            .field("openai", &self.openai.name())
            .field("ollama", &self.ollama.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mock_backend::{MockReply, ScriptedBackend};
    use serde_json::json;

    fn router(config: PipeConfig) -> (Arc<ScriptedBackend>, Arc<ScriptedBackend>, BackendRouter) {
        let openai = Arc::new(
            ScriptedBackend::new("OpenAI").with_default(MockReply::Json(json!({"from": "openai"}))),
        );
        let ollama = Arc::new(
            ScriptedBackend::new("Ollama").with_default(MockReply::Json(json!({"from": "ollama"}))),
        );
        let router = BackendRouter::new(openai.clone(), ollama.clone(), Arc::new(config));
        (openai, ollama, router)
    }

    #[tokio::test]
    async fn test_routes_by_role_flags() {
        let config = PipeConfig::builder()
            .use_openai_api_reasoning_model(true)
            .build();
        let (openai, ollama, router) = router(config);

        let body = router
            .request("m", vec![], StepRole::Reasoning, false, None)
            .await
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(body["from"], "openai");

        let body = router
            .request("m", vec![], StepRole::Responding, false, None)
            .await
            .unwrap()
            .into_json()
            .unwrap();
        assert_eq!(body["from"], "ollama");

        assert_eq!(openai.requests().await.len(), 1);
        assert_eq!(ollama.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_request_carries_model_stream_and_user() {
        let (_, ollama, router) = router(PipeConfig::default());
        let user = User {
            id: "u-1".to_string(),
            ..Default::default()
        };

        router
            .request(
                "qwen2.5:14b",
                vec![ChatMessage::user("q")],
                StepRole::Responding,
                true,
                Some(&user),
            )
            .await
            .unwrap();

        let sent = ollama.requests().await;
        assert_eq!(sent[0].model, "qwen2.5:14b");
        assert!(sent[0].stream);
        assert_eq!(sent[0].user.as_ref().map(|u| u.id.as_str()), Some("u-1"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let router = BackendRouter::new(
            ScriptedBackend::new("OpenAI"),
            ScriptedBackend::new("Ollama").with_reply(MockReply::Fail("refused".into())),
            Arc::new(PipeConfig::default()),
        );

        let err = router
            .request("m", vec![], StepRole::Reasoning, true, None)
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[test]
    fn test_labels() {
        assert_eq!(StepRole::Reasoning.label(), "Reasoning");
        assert_eq!(StepRole::Responding.message_role(), Role::Assistant);
        assert_eq!(BackendKind::from_flag(true).to_string(), "OpenAI");
        assert_eq!(BackendKind::from_flag(false).api_name(), "Ollama");
    }
}
