//! OpenAiBackend implementation using an OpenAI-compatible API.

use backend_core::{
    async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
    CompletionResponse,
};
use reqwest::{Client, RequestBuilder};
use reqwest_eventsource::retry::Never;
use reqwest_eventsource::RequestBuilderExt;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ApiMessage, ChatCompletionRequest};
use crate::config::OpenAiBackendConfig;
use crate::sse::NdjsonSseStream;

/// A backend that talks to an OpenAI-compatible chat completions API.
///
/// Non-streaming calls return the raw `chat.completion` body
/// (`{"choices": [{"message": {"content": ...}}]}`). Streaming calls consume
/// the server-sent events and hand back line-delimited JSON.
pub struct OpenAiBackend {
    client: Client,
    config: OpenAiBackendConfig,
}

impl OpenAiBackend {
    /// Create a new OpenAiBackend with the given configuration.
    pub fn new(config: OpenAiBackendConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| {
                BackendError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        info!(
            "OpenAiBackend initialized with API URL: {}, authenticated: {}",
            config.api_url,
            config.api_key.is_some()
        );

        Ok(Self { client, config })
    }

    /// Create an OpenAiBackend from environment variables.
    ///
    /// See [`OpenAiBackendConfig::from_env`] for the recognized variables.
    pub fn from_env() -> Result<Self, BackendError> {
        Self::new(OpenAiBackendConfig::from_env())
    }

    /// Get the configuration.
    pub fn config(&self) -> &OpenAiBackendConfig {
        &self.config
    }

    fn build_request(&self, request: &CompletionRequest) -> RequestBuilder {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            stream: request.stream,
            user: request.user.as_ref().map(|u| u.id.as_str()),
        };

        debug!(
            model = %request.model,
            stream = request.stream,
            messages = body.messages.len(),
            "Sending request to OpenAI API"
        );

        let mut builder = self
            .client
            .post(self.config.chat_url())
            .header("Content-Type", "application/json")
            .json(&body);

        if let Some(ref key) = self.config.api_key {
            builder = builder.header("Authorization", format!("Bearer {}", key));
        }

        builder
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<serde_json::Value, BackendError> {
        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| BackendError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            // Try to parse as API error
            let message = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);

            warn!("OpenAI API error ({}): {}", status.as_u16(), message);
            return Err(BackendError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(format!("Failed to parse response: {}", e)))
    }

    fn open_stream(&self, request: &CompletionRequest) -> Result<ByteStream, BackendError> {
        let mut event_source = self.build_request(request).eventsource().map_err(|e| {
            BackendError::Configuration(format!("Failed to open event stream: {}", e))
        })?;
        event_source.set_retry_policy(Box::new(Never));

        Ok(ByteStream::new(NdjsonSseStream::new(event_source)))
    }
}

#[async_trait]
impl CompletionBackend for OpenAiBackend {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        if request.stream {
            return self.open_stream(&request).map(CompletionResponse::Stream);
        }

        self.complete(&request).await.map(CompletionResponse::Json)
    }

    fn name(&self) -> &str {
        "OpenAI"
    }
}
