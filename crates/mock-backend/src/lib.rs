//! Mock backend implementations for testing the reasoning pipe.
//!
//! This crate provides mock implementations of the `CompletionBackend` trait:
//! - `ScriptedBackend` - Replays queued replies, records requests, counts stream closes
//! - `EchoBackend` - Echoes the last message back, word by word when streaming
//! - `DelayedBackend` - Wraps another backend with call and per-frame delay
//! - `FailingBackend` - Fails every call
//!
//! For real model servers use the `ollama-backend` and `openai-backend` crates.
//!
//! # Example
//!
//! ```rust
//! use mock_backend::{CompletionBackend, CompletionRequest, MockReply, ScriptedBackend};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), mock_backend::BackendError> {
//!     let backend = ScriptedBackend::new("Scripted").with_reply(MockReply::fragments(["Hel", "lo"]));
//!
//!     let request = CompletionRequest::new("any-model", vec![]).streaming(true);
//!     let mut stream = backend.generate(request).await?.into_stream()?;
//!     while let Some(chunk) = stream.read(1024).await? {
//!         print!("{}", String::from_utf8_lossy(&chunk));
//!     }
//!     Ok(())
//! }
//! ```

mod delayed;
mod echo;
mod failing;
mod scripted;

// Re-export backend-core types for convenience
pub use backend_core::{
    async_trait, BackendError, ByteStream, ChatMessage, CompletionBackend, CompletionRequest,
    CompletionResponse,
};

// Export mock implementations
pub use delayed::DelayedBackend;
pub use echo::EchoBackend;
pub use failing::FailingBackend;
pub use scripted::{MockReply, ScriptedBackend};
