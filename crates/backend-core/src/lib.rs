//! Core trait and types for chat-completion backends.
//!
//! This crate provides the shared interface between the reasoning pipe and
//! the model backends it drives. It defines:
//!
//! - [`CompletionBackend`] - The trait every backend implements (`generate`)
//! - [`ChatMessage`] / [`Role`] / [`User`] - Conversation types
//! - [`CompletionRequest`] / [`CompletionResponse`] - Call shape and result
//! - [`ByteStream`] - A closable, chunked byte source for streaming responses
//! - [`StreamLine`] - The line-delimited JSON wire record streamed by backends
//! - [`BackendError`] - Error types for backend operations
//!
//! # Example
//!
//! ```rust
//! use backend_core::{
//!     async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
//!     CompletionResponse, StreamLine,
//! };
//!
//! struct HelloBackend;
//!
//! #[async_trait]
//! impl CompletionBackend for HelloBackend {
//!     async fn generate(
//!         &self,
//!         request: CompletionRequest,
//!     ) -> Result<CompletionResponse, BackendError> {
//!         if request.stream {
//!             let lines = vec![StreamLine::content("Hello!").to_line(), StreamLine::done().to_line()];
//!             Ok(CompletionResponse::Stream(ByteStream::from_chunks(lines)))
//!         } else {
//!             Ok(CompletionResponse::Json(serde_json::json!({
//!                 "message": { "role": "assistant", "content": "Hello!" }
//!             })))
//!         }
//!     }
//!
//!     fn name(&self) -> &str {
//!         "HelloBackend"
//!     }
//! }
//! ```

mod error;
mod message;
mod stream;
mod trait_def;
mod wire;

pub use error::BackendError;
pub use message::{ChatMessage, CompletionRequest, CompletionResponse, Role, User};
pub use stream::{ByteStream, ChunkStream};
pub use trait_def::CompletionBackend;
pub use wire::{StreamLine, StreamLineMessage};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
