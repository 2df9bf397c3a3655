//! OpenAI-compatible backend for the reasoning pipe.
//!
//! This crate talks to any server exposing `/v1/chat/completions` (OpenAI,
//! vLLM, llama.cpp server, LiteLLM, ...).
//!
//! # Features
//!
//! - Non-streaming calls return the raw `chat.completion` JSON body
//! - Streaming calls consume server-sent events and re-encode each delta as
//!   one line of JSON (`{"message":{"content":..}}`, then `{"done":true}`),
//!   so the pipe decodes both backends the same way
//! - No retries: the event source is opened with a never-retry policy
//! - Configurable via environment variables
//!
//! # Usage
//!
//! ```rust,no_run
//! use openai_backend::{ChatMessage, CompletionBackend, CompletionRequest, OpenAiBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let backend = OpenAiBackend::from_env()?;
//!     let request = CompletionRequest::new("gpt-4o-mini", vec![ChatMessage::user("Hi")]);
//!     let body = backend.generate(request).await?.into_json()?;
//!     println!("{}", body["choices"][0]["message"]["content"]);
//!     Ok(())
//! }
//! ```

mod api_types;
mod backend;
mod config;
mod sse;

pub use backend::OpenAiBackend;
pub use config::{OpenAiBackendConfig, OpenAiBackendConfigBuilder, DEFAULT_API_URL};

// Re-export backend-core types for convenience
pub use backend_core::{
    async_trait, BackendError, ByteStream, ChatMessage, CompletionBackend, CompletionRequest,
    CompletionResponse,
};
