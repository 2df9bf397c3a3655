//! Incremental decoder for line-delimited JSON completion streams.
//!
//! Each line is a JSON object such as
//! `{"message": {"role": "assistant", "content": "..."}, "done": false}`.
//! Chunks may split lines, and even UTF-8 characters, at any byte offset.

use serde_json::Value;
use tracing::{error, warn};

/// Characters of a malformed line included in the error log.
const LOG_PREVIEW_CHARS: usize = 100;

/// Turns raw stream chunks into content fragments.
///
/// One decoder serves exactly one stream.
#[derive(Debug, Default)]
pub struct LineDecoder {
    buffer: String,
    utf8_tail: Vec<u8>,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk and iterate the fragments it completes.
    ///
    /// Iteration stops at the first incomplete line, at the first line that
    /// is not valid JSON (which stays at the front of the buffer), or right
    /// after a line with `"done": true`. Whatever is not consumed is kept for
    /// the next call.
    pub fn feed(&mut self, chunk: &[u8]) -> Fragments<'_> {
        self.push_bytes(chunk);
        Fragments {
            decoder: self,
            halted: false,
        }
    }

    /// Decoded text not consumed yet.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    fn push_bytes(&mut self, chunk: &[u8]) {
        self.utf8_tail.extend_from_slice(chunk);

        let mut start = 0;
        while start < self.utf8_tail.len() {
            match std::str::from_utf8(&self.utf8_tail[start..]) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    start = self.utf8_tail.len();
                }
                Err(e) => {
                    let valid_end = start + e.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.utf8_tail[start..valid_end]));

                    match e.error_len() {
                        Some(len) => {
                            warn!(bytes = len, "Replacing invalid UTF-8 in stream");
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            start = valid_end + len;
                        }
                        // Incomplete character at the end: wait for more bytes.
                        None => {
                            start = valid_end;
                            break;
                        }
                    }
                }
            }
        }

        self.utf8_tail.drain(..start);
    }

    fn take_line(&mut self) -> Option<String> {
        let idx = self.buffer.find('\n')?;
        let raw: String = self.buffer.drain(..=idx).collect();
        Some(raw.trim().to_string())
    }

    fn restore_line(&mut self, line: &str) {
        self.buffer.insert(0, '\n');
        self.buffer.insert_str(0, line);
    }
}

/// Lazy iterator over the fragments completed by one [`LineDecoder::feed`].
pub struct Fragments<'a> {
    decoder: &'a mut LineDecoder,
    halted: bool,
}

impl Iterator for Fragments<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        while !self.halted {
            let Some(line) = self.decoder.take_line() else {
                self.halted = true;
                break;
            };
            if line.is_empty() {
                continue;
            }

            let value: Value = match serde_json::from_str(&line) {
                Ok(value) => value,
                Err(e) => {
                    let preview: String = line.chars().take(LOG_PREVIEW_CHARS).collect();
                    error!(error = %e, "Invalid JSON line in stream: {}", preview);
                    self.decoder.restore_line(&line);
                    self.halted = true;
                    break;
                }
            };

            if value.get("done").and_then(Value::as_bool) == Some(true) {
                self.halted = true;
            }

            let fragment = value
                .get("message")
                .and_then(|m| m.get("content"))
                .and_then(Value::as_str);
            if let Some(fragment) = fragment {
                return Some(fragment.to_string());
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(content: &str) -> String {
        format!(
            "{}\n",
            serde_json::json!({"message": {"role": "assistant", "content": content}, "done": false})
        )
    }

    fn decode_all(decoder: &mut LineDecoder, chunks: &[&[u8]]) -> Vec<String> {
        chunks
            .iter()
            .flat_map(|chunk| decoder.feed(chunk).collect::<Vec<_>>())
            .collect()
    }

    #[test]
    fn test_single_chunk() {
        let payload = format!("{}{}", line("Hel"), line("lo"));
        let mut decoder = LineDecoder::new();

        let fragments: Vec<String> = decoder.feed(payload.as_bytes()).collect();
        assert_eq!(fragments, vec!["Hel", "lo"]);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_partial_line_waits_for_newline() {
        let payload = line("abc");
        let (head, tail) = payload.as_bytes().split_at(10);
        let mut decoder = LineDecoder::new();

        assert_eq!(decoder.feed(head).count(), 0);
        assert_eq!(decoder.buffered().len(), 10);
        assert_eq!(decoder.feed(tail).collect::<Vec<_>>(), vec!["abc"]);
    }

    #[test]
    fn test_split_at_every_offset_is_invariant() {
        let payload = format!("{}{}\n{}{}", line("Ünï"), line("🦀 crab"), line(""), line("end"));
        let bytes = payload.as_bytes();

        let mut whole = LineDecoder::new();
        let expected: Vec<String> = whole.feed(bytes).collect();
        assert_eq!(expected, vec!["Ünï", "🦀 crab", "", "end"]);

        for offset in 0..=bytes.len() {
            let (a, b) = bytes.split_at(offset);
            let mut decoder = LineDecoder::new();
            assert_eq!(decode_all(&mut decoder, &[a, b]), expected, "split at {}", offset);
        }

        let single_bytes: Vec<&[u8]> = bytes.chunks(1).collect();
        let mut decoder = LineDecoder::new();
        assert_eq!(decode_all(&mut decoder, &single_bytes), expected);
    }

    #[test]
    fn test_done_halts_the_chunk() {
        let payload = format!("{}{{\"done\":true}}\n{}", line("a"), line("late"));
        let mut decoder = LineDecoder::new();

        assert_eq!(decoder.feed(payload.as_bytes()).collect::<Vec<_>>(), vec!["a"]);
        assert_eq!(decoder.buffered(), line("late"));
    }

    #[test]
    fn test_content_on_done_line_is_yielded() {
        let payload = "{\"message\":{\"content\":\"last\"},\"done\":true}\n";
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(payload.as_bytes()).collect::<Vec<_>>(), vec!["last"]);
    }

    #[test]
    fn test_malformed_line_is_kept_at_front() {
        let payload = format!("{{oops\n{}", line("after"));
        let mut decoder = LineDecoder::new();

        assert_eq!(decoder.feed(payload.as_bytes()).count(), 0);
        assert!(decoder.buffered().starts_with("{oops\n"));
        assert!(decoder.buffered().ends_with(&line("after")));

        // The same line blocks every later feed.
        assert_eq!(decoder.feed(line("more").as_bytes()).count(), 0);
        assert!(decoder.buffered().starts_with("{oops\n"));
    }

    #[test]
    fn test_lines_without_string_content_are_skipped() {
        let payload = "{\"model\":\"x\"}\n{\"message\":{\"content\":null}}\n\n   \n";
        let mut decoder = LineDecoder::new();

        assert_eq!(decoder.feed(payload.as_bytes()).count(), 0);
        assert_eq!(decoder.buffered(), "");
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut payload = b"{\"message\":{\"content\":\"a".to_vec();
        payload.push(0xFF);
        payload.extend_from_slice(b"b\"}}\n");

        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(&payload).collect::<Vec<_>>(), vec!["a\u{FFFD}b"]);
    }

    #[test]
    fn test_crlf_lines() {
        let payload = "{\"message\":{\"content\":\"x\"}}\r\n";
        let mut decoder = LineDecoder::new();
        assert_eq!(decoder.feed(payload.as_bytes()).collect::<Vec<_>>(), vec!["x"]);
    }
}
