//! Closable chunked byte source for streaming responses.

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures::stream::{self, Stream, StreamExt};
use tracing::debug;

use crate::error::BackendError;

/// Boxed stream of raw body frames.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<Bytes, BackendError>> + Send>>;

type CloseHook = Box<dyn FnOnce() + Send>;

/// A streaming response body.
///
/// Reads hand out at most the requested number of bytes, splitting larger
/// network frames across calls. The stream is released exactly once: either
/// by an explicit [`ByteStream::close`] or, failing that, on drop.
pub struct ByteStream {
    inner: Option<ChunkStream>,
    pending: Bytes,
    on_close: Option<CloseHook>,
    closed: bool,
}

impl ByteStream {
    /// Wrap a stream of body frames.
    pub fn new<S>(stream: S) -> Self
    where
        S: Stream<Item = Result<Bytes, BackendError>> + Send + 'static,
    {
        Self {
            inner: Some(Box::pin(stream)),
            pending: Bytes::new(),
            on_close: None,
            closed: false,
        }
    }

    /// Build a stream that yields the given frames in order.
    pub fn from_chunks<I, B>(chunks: I) -> Self
    where
        I: IntoIterator<Item = B>,
        B: Into<Bytes>,
    {
        let frames: Vec<Result<Bytes, BackendError>> =
            chunks.into_iter().map(|c| Ok(c.into())).collect();
        Self::new(stream::iter(frames))
    }

    /// Register a hook that runs when the stream is released.
    pub fn on_close(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Read up to `max` bytes. `Ok(None)` means the body is exhausted.
    pub async fn read(&mut self, max: usize) -> Result<Option<Bytes>, BackendError> {
        let max = max.max(1);

        if !self.pending.is_empty() {
            return Ok(Some(split_front(&mut self.pending, max)));
        }

        let Some(inner) = self.inner.as_mut() else {
            return Ok(None);
        };

        loop {
            match inner.next().await {
                Some(Ok(frame)) if frame.is_empty() => continue,
                Some(Ok(frame)) => {
                    self.pending = frame;
                    return Ok(Some(split_front(&mut self.pending, max)));
                }
                Some(Err(e)) => return Err(e),
                None => return Ok(None),
            }
        }
    }

    /// Release the underlying body. Safe to call more than once.
    pub fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        self.inner = None;
        self.pending = Bytes::new();
        debug!("Byte stream closed");

        if let Some(hook) = self.on_close.take() {
            hook();
        }
    }

    /// Whether the stream has been released.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl Drop for ByteStream {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for ByteStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteStream")
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

fn split_front(buf: &mut Bytes, max: usize) -> Bytes {
    let n = max.min(buf.len());
    buf.split_to(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_read_splits_large_frames() {
        let mut stream = ByteStream::from_chunks(vec![vec![b'x'; 2500]]);

        assert_eq!(stream.read(1024).await.unwrap().unwrap().len(), 1024);
        assert_eq!(stream.read(1024).await.unwrap().unwrap().len(), 1024);
        assert_eq!(stream.read(1024).await.unwrap().unwrap().len(), 452);
        assert!(stream.read(1024).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_skips_empty_frames() {
        let mut stream = ByteStream::from_chunks(vec!["", "ab", ""]);

        assert_eq!(stream.read(16).await.unwrap().unwrap(), Bytes::from("ab"));
        assert!(stream.read(16).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_read_propagates_errors() {
        let frames = vec![
            Ok(Bytes::from("ok")),
            Err(BackendError::Stream("connection reset".into())),
        ];
        let mut stream = ByteStream::new(futures::stream::iter(frames));

        assert!(stream.read(16).await.unwrap().is_some());
        assert!(matches!(
            stream.read(16).await,
            Err(BackendError::Stream(_))
        ));
    }

    #[tokio::test]
    async fn test_close_runs_hook_once() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let mut stream = ByteStream::from_chunks(vec!["data"]).on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        stream.close();
        stream.close();
        assert!(stream.is_closed());
        assert!(stream.read(16).await.unwrap().is_none());
        drop(stream);

        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_closes() {
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = closes.clone();
        let stream = ByteStream::from_chunks(vec!["data"]).on_close(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        drop(stream);
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
