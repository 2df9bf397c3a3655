//! Configuration for OllamaBackend.

use std::env;
use std::time::Duration;

/// Default Ollama server URL.
pub const DEFAULT_BASE_URL: &str = "http://localhost:11434";

/// Configuration for OllamaBackend.
#[derive(Debug, Clone)]
pub struct OllamaBackendConfig {
    /// Ollama server URL (without the `/api` suffix).
    pub base_url: String,

    /// TCP connect timeout. Reads are never timed out since generations
    /// can run for minutes.
    pub connect_timeout: Duration,
}

impl Default for OllamaBackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

impl OllamaBackendConfig {
    /// Create configuration from environment variables.
    ///
    /// Optional environment variables:
    /// - `OLLAMA_BASE_URL` - Server URL (default: http://localhost:11434)
    /// - `OLLAMA_CONNECT_TIMEOUT_SECS` - Connect timeout (default: 10)
    pub fn from_env() -> Self {
        let base_url =
            env::var("OLLAMA_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        let connect_timeout = env::var("OLLAMA_CONNECT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self {
            base_url: normalize_base_url(&base_url),
            connect_timeout,
        }
    }

    /// Create a new config builder.
    pub fn builder() -> OllamaBackendConfigBuilder {
        OllamaBackendConfigBuilder::default()
    }

    /// Endpoint for chat completions.
    pub fn chat_url(&self) -> String {
        format!("{}/api/chat", self.base_url)
    }
}

/// Builder for OllamaBackendConfig.
#[derive(Debug, Default)]
pub struct OllamaBackendConfigBuilder {
    config: OllamaBackendConfig,
}

impl OllamaBackendConfigBuilder {
    /// Set the server URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = normalize_base_url(&url.into());
        self
    }

    /// Set the connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> OllamaBackendConfig {
        self.config
    }
}

/// Strip trailing slashes and an `/api` suffix.
fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().trim_end_matches('/').to_string();
    if url.ends_with("/api") {
        url.truncate(url.len() - 4);
    }
    url
}
