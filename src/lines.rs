//! Line iteration over streamed response bodies
//!
//! Chunk boundaries are arbitrary, so lines are reassembled from an internal
//! buffer before being yielded.

use bytes::Bytes;
use futures::stream::StreamExt;

use crate::error::ClientError;
use crate::response::BoxStream;

/// Pull-based line iterator over a byte stream
pub struct Lines {
    inner: BoxStream<'static, Result<Bytes, ClientError>>,
    buffer: Vec<u8>,
    done: bool,
}

impl Lines {
    /// Create a line iterator over a byte stream
    pub fn new(stream: BoxStream<'static, Result<Bytes, ClientError>>) -> Self {
        Self {
            inner: stream,
            buffer: Vec::new(),
            done: false,
        }
    }

    /// Get the next line, without its terminator
    ///
    /// Returns `Ok(None)` once the stream is exhausted. A trailing partial
    /// line (no final newline) is yielded as the last item.
    pub async fn next_line(&mut self) -> Result<Option<String>, ClientError> {
        loop {
            if let Some(line) = self.take_buffered_line()? {
                return Ok(Some(line));
            }
            if self.done {
                return self.take_remainder();
            }
            match self.inner.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(e)) => return Err(e),
                None => self.done = true,
            }
        }
    }

    fn take_buffered_line(&mut self) -> Result<Option<String>, ClientError> {
        if let Some(pos) = self.buffer.iter().position(|&b| b == b'\n') {
            let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
            line.pop();
            if line.last() == Some(&b'\r') {
                line.pop();
            }
            return decode(line).map(Some);
        }
        Ok(None)
    }

    fn take_remainder(&mut self) -> Result<Option<String>, ClientError> {
        if self.buffer.is_empty() {
            return Ok(None);
        }
        let rest = std::mem::take(&mut self.buffer);
        decode(rest).map(Some)
    }
}

fn decode(bytes: Vec<u8>) -> Result<String, ClientError> {
    String::from_utf8(bytes).map_err(|e| ClientError::InvalidResponse(e.to_string()))
}

/// Pull-based iterator over newline-delimited JSON values
///
/// Blank lines are skipped, as in the NDJSON convention.
pub struct JsonLines {
    lines: Lines,
}

impl JsonLines {
    /// Create a JSON line iterator
    pub fn new(lines: Lines) -> Self {
        Self { lines }
    }

    /// Get the next parsed JSON value
    pub async fn next_value(&mut self) -> Result<Option<serde_json::Value>, ClientError> {
        loop {
            match self.lines.next_line().await? {
                Some(line) if line.trim().is_empty() => {}
                Some(line) => {
                    let value = serde_json::from_str(&line)
                        .map_err(|e| ClientError::InvalidResponse(e.to_string()))?;
                    return Ok(Some(value));
                }
                None => return Ok(None),
            }
        }
    }
}

// ===========================================================================
// Unit Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use futures::stream;

    fn lines_over(chunks: Vec<&'static str>) -> Lines {
        let items: Vec<Result<Bytes, ClientError>> =
            chunks.into_iter().map(|c| Ok(Bytes::from(c))).collect();
        Lines::new(Box::pin(stream::iter(items)))
    }

    #[tokio::test]
    async fn test_lines_single_chunk() {
        let mut lines = lines_over(vec!["a\nb\nc\n"]);
        assert_eq!(lines.next_line().await.unwrap(), Some("a".into()));
        assert_eq!(lines.next_line().await.unwrap(), Some("b".into()));
        assert_eq!(lines.next_line().await.unwrap(), Some("c".into()));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lines_fragmented_chunks() {
        let mut lines = lines_over(vec!["hel", "lo\nwor", "ld\n"]);
        assert_eq!(lines.next_line().await.unwrap(), Some("hello".into()));
        assert_eq!(lines.next_line().await.unwrap(), Some("world".into()));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lines_crlf() {
        let mut lines = lines_over(vec!["one\r\ntwo\r\n"]);
        assert_eq!(lines.next_line().await.unwrap(), Some("one".into()));
        assert_eq!(lines.next_line().await.unwrap(), Some("two".into()));
    }

    #[tokio::test]
    async fn test_lines_trailing_partial() {
        let mut lines = lines_over(vec!["complete\npartial"]);
        assert_eq!(lines.next_line().await.unwrap(), Some("complete".into()));
        assert_eq!(lines.next_line().await.unwrap(), Some("partial".into()));
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lines_empty_stream() {
        let mut lines = lines_over(vec![]);
        assert_eq!(lines.next_line().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_lines_propagates_stream_error() {
        let items: Vec<Result<Bytes, ClientError>> = vec![
            Ok(Bytes::from("good\n")),
            Err(ClientError::Connection("reset".into())),
        ];
        let mut lines = Lines::new(Box::pin(stream::iter(items)));
        assert_eq!(lines.next_line().await.unwrap(), Some("good".into()));
        assert!(lines.next_line().await.unwrap_err().is_connection());
    }

    #[tokio::test]
    async fn test_json_lines() {
        let mut values = JsonLines::new(lines_over(vec!["{\"n\":1}\n\n{\"n\":2}\n"]));
        assert_eq!(
            values.next_value().await.unwrap(),
            Some(serde_json::json!({"n": 1}))
        );
        assert_eq!(
            values.next_value().await.unwrap(),
            Some(serde_json::json!({"n": 2}))
        );
        assert_eq!(values.next_value().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_json_lines_invalid() {
        let mut values = JsonLines::new(lines_over(vec!["not json\n"]));
        assert!(matches!(
            values.next_value().await,
            Err(ClientError::InvalidResponse(_))
        ));
    }
}
