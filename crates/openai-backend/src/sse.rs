//! Server-sent event stream normalized to line-delimited JSON.
//!
//! OpenAI-compatible servers stream `data: {chat.completion.chunk}` events
//! terminated by `data: [DONE]`. The pipe consumes one JSON object per line
//! (`{"message":{"content":..}}` fragments, then `{"done":true}`), so each
//! event is re-encoded as one such line before it reaches the caller.

use std::pin::Pin;
use std::task::{Context, Poll};

use backend_core::{BackendError, StreamLine};
use bytes::Bytes;
use futures::stream::Stream;
use reqwest_eventsource::{Error as EventSourceError, Event, EventSource};
use tracing::{debug, error, warn};

use crate::api_types::ChatCompletionChunk;

/// Outcome of translating one SSE `data` payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum SseFrame {
    /// A content line to hand to the caller.
    Line(Bytes),
    /// The end-of-turn line; nothing follows.
    Done(Bytes),
    /// Nothing to emit (role-only delta, finish marker, unparseable event).
    Skip,
}

/// Translate one event payload into a wire line.
pub(crate) fn translate_event_data(data: &str) -> SseFrame {
    let data = data.trim();
    if data == "[DONE]" {
        return SseFrame::Done(Bytes::from(StreamLine::done().to_line()));
    }

    match serde_json::from_str::<ChatCompletionChunk>(data) {
        Ok(chunk) => {
            let text = chunk.text();
            if text.is_empty() {
                SseFrame::Skip
            } else {
                SseFrame::Line(Bytes::from(StreamLine::content(text).to_line()))
            }
        }
        Err(e) => {
            warn!("Failed to parse SSE chunk: {}", e);
            debug!("Raw data: {}", data);
            SseFrame::Skip
        }
    }
}

/// A streaming completion body re-encoded as line-delimited JSON.
pub struct NdjsonSseStream {
    event_source: EventSource,
    finished: bool,
}

impl NdjsonSseStream {
    pub fn new(event_source: EventSource) -> Self {
        Self {
            event_source,
            finished: false,
        }
    }

    fn finish(&mut self) {
        self.finished = true;
        self.event_source.close();
    }
}

impl Stream for NdjsonSseStream {
    type Item = Result<Bytes, BackendError>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.finished {
            return Poll::Ready(None);
        }

        loop {
            match Pin::new(&mut self.event_source).poll_next(cx) {
                Poll::Ready(Some(Ok(Event::Open))) => {
                    debug!("SSE connection opened");
                    continue;
                }
                Poll::Ready(Some(Ok(Event::Message(msg)))) => match translate_event_data(&msg.data) {
                    SseFrame::Line(line) => return Poll::Ready(Some(Ok(line))),
                    SseFrame::Done(line) => {
                        self.finish();
                        return Poll::Ready(Some(Ok(line)));
                    }
                    SseFrame::Skip => continue,
                },
                Poll::Ready(Some(Err(EventSourceError::StreamEnded))) | Poll::Ready(None) => {
                    debug!("SSE stream ended");
                    self.finish();
                    return Poll::Ready(None);
                }
                Poll::Ready(Some(Err(EventSourceError::InvalidStatusCode(status, _)))) => {
                    error!("SSE request rejected with status {}", status);
                    self.finish();
                    return Poll::Ready(Some(Err(BackendError::Api {
                        status: status.as_u16(),
                        message: format!("request rejected with status {}", status),
                    })));
                }
                Poll::Ready(Some(Err(e))) => {
                    error!("SSE error: {}", e);
                    self.finish();
                    return Poll::Ready(Some(Err(BackendError::Stream(e.to_string()))));
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
