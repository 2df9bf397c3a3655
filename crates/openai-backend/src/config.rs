//! Configuration for OpenAiBackend.

use std::env;
use std::time::Duration;

/// Default API URL.
pub const DEFAULT_API_URL: &str = "https://api.openai.com";

/// Configuration for OpenAiBackend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendConfig {
    /// API URL (without the `/v1` suffix).
    pub api_url: String,

    /// API key for authentication. Local OpenAI-compatible servers often
    /// need none.
    pub api_key: Option<String>,

    /// TCP connect timeout.
    pub connect_timeout: Duration,
}

impl Default for OpenAiBackendConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl OpenAiBackendConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `OPENAI_API_BASE_URL` - API URL (default: https://api.openai.com)
    /// - `OPENAI_API_KEY` - API key (default: none)
    /// - `OPENAI_CONNECT_TIMEOUT_SECS` - Connect timeout (default: 10)
    pub fn from_env() -> Self {
        let api_url =
            env::var("OPENAI_API_BASE_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let api_key = env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());

        let connect_timeout = env::var("OPENAI_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            api_url: normalize_api_url(&api_url),
            api_key,
            connect_timeout,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> OpenAiBackendConfigBuilder {
        OpenAiBackendConfigBuilder::default()
    }

    /// Endpoint for chat completions.
    pub fn chat_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url)
    }
}

/// Builder for OpenAiBackendConfig.
#[derive(Debug, Default)]
pub struct OpenAiBackendConfigBuilder {
    config: OpenAiBackendConfig,
}

impl OpenAiBackendConfigBuilder {
    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = normalize_api_url(&url.into());
        self
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OpenAiBackendConfig {
        self.config
    }
}

/// Strip trailing slashes and a `/v1` suffix.
fn normalize_api_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/').to_string();
    if url.ends_with("/v1") {
        url.truncate(url.len() - 3);
    }
    url
}
