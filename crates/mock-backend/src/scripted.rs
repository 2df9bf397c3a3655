//! Scripted backend - replays queued replies and records every request.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use backend_core::{
    async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
    CompletionResponse, StreamLine,
};
use bytes::Bytes;
use futures::stream;
use serde_json::Value;
use tokio::sync::Mutex;

/// One scripted answer.
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Stream these raw frames, in order.
    Stream(Vec<Bytes>),
    /// Stream these frames, then fail the next read.
    BrokenStream { frames: Vec<Bytes>, error: String },
    /// Answer with a JSON body.
    Json(Value),
    /// Fail the call itself.
    Fail(String),
}

impl MockReply {
    /// Stream one content line per fragment followed by the `done` line,
    /// each line in its own frame.
    pub fn fragments<I, S>(fragments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut frames: Vec<Bytes> = fragments
            .into_iter()
            .map(|f| Bytes::from(StreamLine::content(f).to_line()))
            .collect();
        frames.push(Bytes::from(StreamLine::done().to_line()));
        MockReply::Stream(frames)
    }

    /// Stream arbitrary raw frames.
    pub fn raw<I, B>(frames: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        MockReply::Stream(frames.into_iter().map(Into::into).collect())
    }
}

/// A backend that replays scripted replies in call order.
///
/// Every request is recorded and every stream it hands out bumps a close
/// counter when released, so tests can assert on prompts and on resource
/// cleanup.
pub struct ScriptedBackend {
    name: String,
    replies: Mutex<VecDeque<MockReply>>,
    default_reply: Option<MockReply>,
    requests: Mutex<Vec<CompletionRequest>>,
    streams_opened: Arc<AtomicUsize>,
    streams_closed: Arc<AtomicUsize>,
}

impl ScriptedBackend {
    /// Create an empty script. Calls beyond the script fail.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            replies: Mutex::new(VecDeque::new()),
            default_reply: None,
            requests: Mutex::new(Vec::new()),
            streams_opened: Arc::new(AtomicUsize::new(0)),
            streams_closed: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Append a reply to the script.
    pub fn with_reply(mut self, reply: MockReply) -> Self {
        self.replies.get_mut().push_back(reply);
        self
    }

    /// Reply used once the script runs out.
    pub fn with_default(mut self, reply: MockReply) -> Self {
        self.default_reply = Some(reply);
        self
    }

    /// Requests received so far, in order.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }

    /// Number of streams handed out.
    pub fn streams_opened(&self) -> usize {
        self.streams_opened.load(Ordering::SeqCst)
    }

    /// Number of streams released.
    pub fn streams_closed(&self) -> usize {
        self.streams_closed.load(Ordering::SeqCst)
    }

    fn track(&self, stream: ByteStream) -> ByteStream {
        self.streams_opened.fetch_add(1, Ordering::SeqCst);
        let closed = self.streams_closed.clone();
        stream.on_close(move || {
            closed.fetch_add(1, Ordering::SeqCst);
        })
    }
}

#[async_trait]
impl CompletionBackend for ScriptedBackend {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        self.requests.lock().await.push(request);

        let reply = self
            .replies
            .lock()
            .await
            .pop_front()
            .or_else(|| self.default_reply.clone())
            .ok_or_else(|| BackendError::Network(format!("{}: script exhausted", self.name)))?;

        match reply {
            MockReply::Stream(frames) => Ok(CompletionResponse::Stream(
                self.track(ByteStream::from_chunks(frames)),
            )),
            MockReply::BrokenStream { frames, error } => {
                let items: Vec<Result<Bytes, BackendError>> = frames
                    .into_iter()
                    .map(Ok)
                    .chain(std::iter::once(Err(BackendError::Stream(error))))
                    .collect();
                Ok(CompletionResponse::Stream(
                    self.track(ByteStream::new(stream::iter(items))),
                ))
            }
            MockReply::Json(value) => Ok(CompletionResponse::Json(value)),
            MockReply::Fail(message) => Err(BackendError::Network(message)),
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use backend_core::ChatMessage;

    fn request() -> CompletionRequest {
        CompletionRequest::new("m", vec![ChatMessage::user("q")]).streaming(true)
    }

    #[tokio::test]
    async fn test_replays_in_order() {
        let backend = ScriptedBackend::new("Scripted")
            .with_reply(MockReply::Json(serde_json::json!({"n": 1})))
            .with_reply(MockReply::Fail("boom".into()));

        let first = backend.generate(request()).await.unwrap().into_json().unwrap();
        assert_eq!(first["n"], 1);
        assert!(backend.generate(request()).await.is_err());
        assert!(backend.generate(request()).await.is_err());
        assert_eq!(backend.requests().await.len(), 3);
    }

    #[tokio::test]
    async fn test_default_reply() {
        let backend = ScriptedBackend::new("Scripted").with_default(MockReply::fragments(["x"]));

        for _ in 0..3 {
            assert!(backend.generate(request()).await.is_ok());
        }
        assert_eq!(backend.streams_opened(), 3);
        assert_eq!(backend.streams_closed(), 3);
    }

    #[tokio::test]
    async fn test_fragments_frames() {
        let MockReply::Stream(frames) = MockReply::fragments(["a", "b"]) else {
            panic!("expected stream");
        };
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[2], Bytes::from("{\"done\":true}\n"));
    }

    #[tokio::test]
    async fn test_broken_stream_fails_after_frames() {
        let backend = ScriptedBackend::new("Scripted").with_reply(MockReply::BrokenStream {
            frames: vec![Bytes::from("x")],
            error: "reset".into(),
        });

        let mut stream = backend.generate(request()).await.unwrap().into_stream().unwrap();
        assert!(stream.read(1024).await.unwrap().is_some());
        assert!(stream.read(1024).await.is_err());
        stream.close();
        assert_eq!(backend.streams_closed(), 1);
    }
}
