//! Error types for backend operations.

use thiserror::Error;

/// Errors that can occur while talking to a completion backend.
#[derive(Debug, Error)]
pub enum BackendError {
    /// The backend is misconfigured (bad URL, missing key, ...).
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The request could not be delivered.
    #[error("network error: {0}")]
    Network(String),

    /// The backend answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The backend answered with a body we could not interpret.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// The byte stream failed mid-read.
    #[error("stream error: {0}")]
    Stream(String),
}

impl BackendError {
    /// Whether this error happened before any response was received.
    pub fn is_transport(&self) -> bool {
        matches!(self, BackendError::Network(_) | BackendError::Configuration(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = BackendError::Api {
            status: 404,
            message: "model 'nope' not found".to_string(),
        };
        assert_eq!(err.to_string(), "API error (404): model 'nope' not found");
    }

    #[test]
    fn test_is_transport() {
        assert!(BackendError::Network("refused".into()).is_transport());
        assert!(!BackendError::Stream("reset".into()).is_transport());
    }
}
