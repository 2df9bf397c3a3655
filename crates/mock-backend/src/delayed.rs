//! Delayed backend - wraps another backend with artificial latency.

use std::time::Duration;

use backend_core::{
    async_trait, BackendError, ByteStream, CompletionBackend, CompletionRequest,
    CompletionResponse,
};
use futures::stream;
use tokio::time::sleep;

/// A backend that wraps another backend and adds artificial delay.
///
/// The call itself waits `delay`; streamed bodies additionally wait
/// `frame_delay` before every frame. Useful for exercising reasoning
/// deadlines and simulating slow generation.
pub struct DelayedBackend<B: CompletionBackend> {
    inner: B,
    delay: Duration,
    frame_delay: Duration,
}

impl<B: CompletionBackend> DelayedBackend<B> {
    /// Create a new DelayedBackend wrapping the given backend.
    pub fn new(inner: B, delay: Duration, frame_delay: Duration) -> Self {
        Self {
            inner,
            delay,
            frame_delay,
        }
    }

    /// Delay every streamed frame by the given number of milliseconds.
    pub fn per_frame_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::ZERO, Duration::from_millis(millis))
    }

    /// Delay the call by the given number of milliseconds.
    pub fn with_millis(inner: B, millis: u64) -> Self {
        Self::new(inner, Duration::from_millis(millis), Duration::ZERO)
    }

    /// Get the wrapped backend.
    pub fn inner(&self) -> &B {
        &self.inner
    }
}

fn slow_stream(inner: ByteStream, frame_delay: Duration) -> ByteStream {
    let frames = stream::unfold(inner, move |mut inner| async move {
        sleep(frame_delay).await;
        match inner.read(usize::MAX).await {
            Ok(Some(frame)) => Some((Ok(frame), inner)),
            Ok(None) => None,
            Err(e) => Some((Err(e), inner)),
        }
    });
    ByteStream::new(frames)
}

#[async_trait]
impl<B: CompletionBackend> CompletionBackend for DelayedBackend<B> {
    async fn generate(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, BackendError> {
        sleep(self.delay).await;

        match self.inner.generate(request).await? {
            CompletionResponse::Stream(inner) if !self.frame_delay.is_zero() => Ok(
                CompletionResponse::Stream(slow_stream(inner, self.frame_delay)),
            ),
            other => Ok(other),
        }
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn is_ready(&self) -> bool {
        self.inner.is_ready().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EchoBackend, MockReply, ScriptedBackend};
    use backend_core::ChatMessage;
    use std::time::Instant;

    #[tokio::test]
    async fn test_delayed_call() {
        let backend = DelayedBackend::with_millis(EchoBackend::new(), 50);
        let request = CompletionRequest::new("m", vec![ChatMessage::user("test")]);

        let start = Instant::now();
        let body = backend.generate(request).await.unwrap().into_json().unwrap();

        assert_eq!(body["message"]["content"], "test");
        assert!(start.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_frame_delay_and_close_propagates() {
        let scripted = ScriptedBackend::new("Scripted").with_reply(MockReply::raw(["a", "b"]));
        let backend = DelayedBackend::per_frame_millis(scripted, 20);
        let request = CompletionRequest::new("m", vec![]).streaming(true);

        let start = Instant::now();
        let mut stream = backend.generate(request).await.unwrap().into_stream().unwrap();
        assert!(stream.read(1024).await.unwrap().is_some());
        assert!(start.elapsed() >= Duration::from_millis(20));

        stream.close();
        assert_eq!(backend.inner().streams_closed(), 1);
    }

    #[test]
    fn test_name_is_inner_name() {
        let backend = DelayedBackend::with_millis(EchoBackend::new(), 0);
        assert_eq!(backend.name(), "EchoBackend");
    }
}
