//! Echo backend - answers with the last message it was sent.

use backend_core::{
    async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
    CompletionResponse, StreamLine,
};
use serde_json::json;

/// A backend that echoes the last message back.
///
/// Streaming replies split the text into word fragments, one JSON line each,
/// followed by the `done` line. Non-streaming replies use the Ollama shape
/// (`{"message": {"content": ...}}`).
#[derive(Debug, Clone, Default)]
pub struct EchoBackend {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoBackend {
    /// Create a new EchoBackend with no prefix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new EchoBackend with a custom prefix.
    ///
    /// # Example
    ///
    /// ```rust
    /// use mock_backend::EchoBackend;
    ///
    /// let backend = EchoBackend::with_prefix("Echo: ");
    /// // Will respond with "Echo: <last message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }

    fn reply_text(&self, request: &CompletionRequest) -> String {
        let last = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or_default();

        match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, last),
            None => last.to_string(),
        }
    }
}

/// Split text into fragments that concatenate back to the input.
fn word_fragments(text: &str) -> Vec<String> {
    text.split_inclusive(' ').map(str::to_string).collect()
}

#[async_trait]
impl CompletionBackend for EchoBackend {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        let text = self.reply_text(&request);

        if !request.stream {
            return Ok(CompletionResponse::Json(json!({
                "model": request.model,
                "message": { "role": "assistant", "content": text },
                "done": true,
            })));
        }

        let mut lines: Vec<String> = word_fragments(&text)
            .into_iter()
            .map(|f| StreamLine::content(f).to_line())
            .collect();
        lines.push(StreamLine::done().to_line());

        Ok(CompletionResponse::Stream(ByteStream::from_chunks(lines)))
    }

    fn name(&self) -> &str {
        "EchoBackend"
    }
}
