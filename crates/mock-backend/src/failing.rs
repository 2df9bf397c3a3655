//! Failing backend - every call errors.

use backend_core::{
    async_trait, BackendError, CompletionBackend, CompletionRequest, CompletionResponse,
};

/// A backend whose calls always fail.
///
/// Useful for testing how failures are reported without touching a network.
#[derive(Debug, Clone)]
pub struct FailingBackend {
    status: Option<u16>,
    message: String,
}

impl FailingBackend {
    /// Fail every call with a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self {
            status: None,
            message: message.into(),
        }
    }

    /// Fail every call with an API status error.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self {
            status: Some(status),
            message: message.into(),
        }
    }
}

#[async_trait]
impl CompletionBackend for FailingBackend {
    async fn generate(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        Err(match self.status {
            Some(status) => BackendError::Api {
                status,
                message: self.message.clone(),
            },
            None => BackendError::Network(self.message.clone()),
        })
    }

    fn name(&self) -> &str {
        "FailingBackend"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_api_failure() {
        let backend = FailingBackend::api(404, "model not found");
        let err = backend
            .generate(CompletionRequest::new("m", vec![]))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error (404): model not found");
        assert!(!backend.is_ready().await);
    }

    #[tokio::test]
    async fn test_network_failure() {
        let backend = FailingBackend::network("connection refused");
        let err = backend
            .generate(CompletionRequest::new("m", vec![]))
            .await
            .unwrap_err();

        assert!(matches!(err, BackendError::Network(_)));
    }
}
