//! Ollama backend for the reasoning pipe.
//!
//! Talks to an Ollama server's `/api/chat` endpoint. Streaming calls return
//! the server's line-delimited JSON body as a [`ByteStream`] without
//! re-encoding; non-streaming calls return the decoded JSON body, shaped
//! `{"message": {"content": ...}}`.
//!
//! # Usage
//!
//! ```rust,no_run
//! use ollama_backend::{CompletionBackend, CompletionRequest, ChatMessage, OllamaBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = OllamaBackend::from_env()?;
//!     let request = CompletionRequest::new("llama3", vec![ChatMessage::user("Hi")]);
//!     let body = backend.generate(request).await?.into_json()?;
//!     println!("{}", body["message"]["content"]);
//!     Ok(())
//! }
//! ```

mod api_types;
mod backend;
mod config;

pub use backend::OllamaBackend;
pub use config::{OllamaBackendConfig, OllamaBackendConfigBuilder, DEFAULT_BASE_URL};

// Re-export backend-core types for convenience
pub use backend_core::{
    async_trait, BackendError, ByteStream, ChatMessage, CompletionBackend, CompletionRequest,
    CompletionResponse,
};
