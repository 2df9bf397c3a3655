//! OllamaBackend implementation using the Ollama HTTP API.

use backend_core::{
    async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
    CompletionResponse,
};
use futures::StreamExt;
use reqwest::{Client, Response};
use tracing::{debug, info, warn};

use crate::api_types::{ChatRequest, OllamaError, OllamaMessage};
use crate::config::OllamaBackendConfig;

/// A backend that talks to an Ollama server.
///
/// Streaming responses are handed back verbatim: Ollama already streams one
/// JSON object per line with `message.content` fragments and a final
/// `done: true` record.
pub struct OllamaBackend {
    client: Client,
    config: OllamaBackendConfig,
}

impl OllamaBackend {
    /// Create a new OllamaBackend with the given configuration.
    pub fn new(config: OllamaBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| {
                BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!("OllamaBackend initialized with base URL: {}", config.base_url);

        Ok(Self { client, config })
    }

    /// Create an OllamaBackend from environment variables.
    ///
    /// See [`OllamaBackendConfig::from_env`] for the recognized variables.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(OllamaBackendConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &OllamaBackendConfig {
        &self.config
    }

    async fn send(&self, request: &CompletionRequest) -> Result<Response, BackendError> {
        let body = ChatRequest {
            model: &request.model,
            messages: request.messages.iter().map(OllamaMessage::from).collect(),
            stream: request.stream,
        };

        debug!(
            model = %request.model,
            stream = request.stream,
            messages = body.messages.len(),
            user = request.user.as_ref().map(|u| u.id.as_str()).unwrap_or("-"),
            "Sending request to Ollama"
        );

        let response = self
            .client
            .post(self.config.chat_url())
            .json(&body)
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let error_text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<OllamaError>(&error_text)
            .map(|e| e.error)
            .unwrap_or(error_text);

        warn!("Ollama API error ({}): {}", status.as_u16(), message);
        Err(BackendError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl CompletionBackend for OllamaBackend {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let response = self.send(&request).await?;

        if request.stream {
            let body = response
                .bytes_stream()
                .map(|frame| frame.map_err(|e| BackendError::Stream(e.to_string())));
            return Ok(CompletionResponse::Stream(ByteStream::new(body)));
        }

        let value = response.json().await.map_err(|e| {
            BackendError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        Ok(CompletionResponse::Json(value))
    }

    fn name(&self) -> &str {
        "Ollama"
    }
}
