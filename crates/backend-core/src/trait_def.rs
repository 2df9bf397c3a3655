//! The CompletionBackend trait definition.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::BackendError;
use crate::message::{CompletionRequest, CompletionResponse};

/// A chat-completion service the pipe can call.
///
/// Implementations range from HTTP clients for real model servers to
/// scripted mocks. This trait is object-safe and can be used with
/// `Arc<dyn CompletionBackend>`.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Issue one chat completion.
    ///
    /// # Arguments
    ///
    /// * `request` - Model id, messages, stream flag and acting user.
    ///
    /// # Returns
    ///
    /// [`CompletionResponse::Stream`] when `request.stream` is set, otherwise
    /// [`CompletionResponse::Json`]. Backends never retry.
    async fn generate(&self, request: CompletionRequest)
        -> Result<CompletionResponse, BackendError>;

    /// Get a human-readable name for this backend.
    fn name(&self) -> &str;

    /// Check if the backend is ready to take requests.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}

#[async_trait]
impl<T: CompletionBackend + ?Sized> CompletionBackend for Arc<T> {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        (**self).generate(request).await
    }

    fn name(&self) -> &str {
        (**self).name()
    }

    async fn is_ready(&self) -> bool {
        (**self).is_ready().await
    }
}
