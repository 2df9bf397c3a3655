//! Multi-stage reasoning pipe for chat hosts.
//!
//! This crate provides the [`ReasoningPipe`] type, which answers a chat
//! query in three stages and streams every step to the host as it is
//! generated.
//!
//! # Features
//!
//! - Initial reasoning per configured reasoning model
//! - Iterative chain-of-thought refinement over each model's own history
//! - One final answer from the responding model, built from all chains
//! - Per-step routing to an Ollama or an OpenAI-compatible backend
//! - Cooperative reasoning time budget
//! - Lightweight task mode for auxiliary host calls (titles, tags)
//!
//! # Architecture
//!
//! ```text
//! Host (chat UI / HTTP gateway)
//!          ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      REASONING PIPE                         │
//! │                                                             │
//! │  1. Initial reasoning        (each reasoning model)         │
//! │         ↓                                                   │
//! │  2. Chain of thought x N     (each reasoning model)         │
//! │         ↓                                                   │
//! │  3. Final response           (responding model)             │
//! │         ↓                                                   │
//! │  4. "Reasoned with N tokens in Ts"                          │
//! └─────────────────────────────────────────────────────────────┘
//!          ↓ every step
//! BackendRouter → Ollama (/api/chat) | OpenAI (/v1/chat/completions)
//!          ↓ line-delimited JSON
//! LineDecoder → fragments → EventEmitter (message + status events)
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use reasoning_pipe::{LoggingEmitter, PipeRequest, ReasoningPipe};
//! use backend_core::ChatMessage;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipe = ReasoningPipe::from_env()?;
//!
//!     let request = PipeRequest::new(vec![ChatMessage::user("Reverse a linked list in Rust")]);
//!     let answer = pipe.run(request, &LoggingEmitter).await?;
//!
//!     println!("{}", answer);
//!     Ok(())
//! }
//! ```

mod adapter;
mod config;
mod decoder;
mod discovery;
mod emitter;
mod error;
mod events;
mod pipeline;
pub mod prompts;
mod reporter;
mod step;

pub use adapter::{BackendKind, BackendRouter, StepRole};
pub use config::{parse_model_list, PipeConfig, PipeConfigBuilder};
pub use decoder::{Fragments, LineDecoder};
pub use discovery::{pipes, PipeDescriptor, PIPE_NAME_PREFIX, PIPE_TYPE};
pub use emitter::{ChannelEmitter, CollectingEmitter, EventEmitter, LoggingEmitter, NoOpEmitter};
pub use error::PipeError;
pub use events::PipeEvent;
pub use pipeline::{
    extract_content, last_user_message, PipeRequest, ReasoningPipe, Stage, NO_CONTENT_PLACEHOLDER,
};
pub use reporter::Reporter;
pub use step::{RunTotals, StepRunner, READ_CHUNK_SIZE};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
