//! Error types for pipe operations.

use backend_core::BackendError;
use thiserror::Error;

/// Errors that can escape a pipe invocation.
///
/// Backend failures during a step are reported to the host as status events
/// and never surface here; only the host's own callback failing aborts a run.
#[derive(Debug, Error)]
pub enum PipeError {
    /// The host's event emitter rejected an event.
    #[error("event emission failed: {0}")]
    Emit(String),

    /// A backend could not be constructed.
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Configuration(String),
}
