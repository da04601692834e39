//! Framed I/O for the POP3 protocol.
//!
//! POP3 responses carry no length prefix. The only frame boundary is a
//! literal terminator: `CRLF` for single-line responses and `CRLF.CRLF`
//! for multi-line ones. Bytes are accumulated in an owned buffer and
//! scanned until the terminator shows up, which keeps framing correct
//! however TCP chunks the data.

use std::io;
use std::time::Duration;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use crate::{Error, Result};

/// Single-line response terminator.
pub const LINE_TERMINATOR: &[u8] = b"\r\n";

/// Multi-line response terminator.
pub const MULTILINE_TERMINATOR: &[u8] = b"\r\n.\r\n";

/// Default buffer size for reading.
const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Maximum response size to prevent memory exhaustion.
const MAX_RESPONSE_SIZE: usize = 64 * 1024 * 1024; // 64 MB

/// Framed connection for the POP3 protocol.
///
/// Every read and write is bounded by the configured timeout.
pub struct FramedStream<S> {
    stream: S,
    buffer: BytesMut,
    timeout: Duration,
}

impl<S> FramedStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Creates a new framed stream.
    pub fn new(stream: S, timeout: Duration) -> Self {
        Self {
            stream,
            buffer: BytesMut::with_capacity(DEFAULT_BUFFER_SIZE),
            timeout,
        }
    }

    /// Reads until `terminator` has been received.
    ///
    /// Returns everything up to and including the first occurrence of
    /// the terminator. Bytes received after it stay buffered for the
    /// next call and never become part of this frame.
    ///
    /// # Errors
    ///
    /// [`Error::Timeout`] if the terminator does not arrive in time,
    /// [`Error::Transport`] if the socket fails or closes, and
    /// [`Error::Protocol`] if the response grows beyond the size limit.
    pub async fn read_until(&mut self, terminator: &[u8]) -> Result<String> {
        let limit = self.timeout;
        match timeout(limit, self.fill_until(terminator)).await {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(limit)),
        }
    }

    /// Reads a single CRLF-terminated line.
    ///
    /// # Errors
    ///
    /// Same as [`read_until`](Self::read_until).
    pub async fn read_line(&mut self) -> Result<String> {
        self.read_until(LINE_TERMINATOR).await
    }

    async fn fill_until(&mut self, terminator: &[u8]) -> Result<String> {
        if terminator.is_empty() {
            return Ok(String::new());
        }

        let mut scanned = 0;
        loop {
            if let Some(pos) = find(&self.buffer[scanned..], terminator) {
                let end = scanned + pos + terminator.len();
                let frame = self.buffer.split_to(end);
                return Ok(String::from_utf8_lossy(&frame).into_owned());
            }

            // A terminator split across reads may start in the current tail
            scanned = self.buffer.len().saturating_sub(terminator.len() - 1);

            if self.buffer.len() > MAX_RESPONSE_SIZE {
                return Err(Error::Protocol(format!(
                    "response too large (max {MAX_RESPONSE_SIZE} bytes)"
                )));
            }

            self.buffer.reserve(DEFAULT_BUFFER_SIZE);
            let read = self.stream.read_buf(&mut self.buffer).await?;
            if read == 0 {
                return Err(Error::Transport(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "connection closed",
                )));
            }
        }
    }

    /// Reads a multi-line body whose status line was already consumed.
    ///
    /// The status line's CRLF also opens the `CRLF.CRLF` terminator, so
    /// an empty body arrives as a bare `.\r\n`. The returned text keeps
    /// the final `.\r\n` line.
    ///
    /// # Errors
    ///
    /// Same as [`read_until`](Self::read_until).
    pub async fn read_body(&mut self) -> Result<String> {
        let mut buffer = BytesMut::with_capacity(self.buffer.len() + DEFAULT_BUFFER_SIZE);
        buffer.extend_from_slice(LINE_TERMINATOR);
        buffer.extend_from_slice(&self.buffer);
        self.buffer = buffer;

        let block = self.read_until(MULTILINE_TERMINATOR).await?;
        Ok(block[LINE_TERMINATOR.len()..].to_string())
    }

    /// Writes raw bytes and flushes.
    ///
    /// # Errors
    ///
    /// [`Error::Transport`] on socket failure, [`Error::Timeout`] if the
    /// write does not complete in time.
    pub async fn write(&mut self, data: &[u8]) -> Result<()> {
        let limit = self.timeout;
        let stream = &mut self.stream;
        let write = async {
            stream.write_all(data).await?;
            stream.flush().await
        };
        match timeout(limit, write).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(Error::Timeout(limit)),
        }
    }

    /// Shuts down the write side of the stream, ignoring failures.
    pub async fn shutdown(&mut self) {
        let _ = timeout(self.timeout, self.stream.shutdown()).await;
    }
}

/// Finds the first occurrence of `needle` in `haystack`.
fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::needless_collect,
    clippy::similar_names
)]
mod tests {
    use proptest::prelude::*;
    use tokio_test::io::Builder;

    use super::*;
    use crate::ErrorKind;

    const TIMEOUT: Duration = Duration::from_secs(5);

    #[test]
    fn test_find() {
        assert_eq!(find(b"hello\r\n", b"\r\n"), Some(5));
        assert_eq!(find(b"\r\n", b"\r\n"), Some(0));
        assert_eq!(find(b"no newline", b"\r\n"), None);
        assert_eq!(find(b"a\r\n.\r\n", MULTILINE_TERMINATOR), Some(1));
        assert_eq!(find(b"a\r\n..\r\n", MULTILINE_TERMINATOR), None);
    }

    #[tokio::test]
    async fn test_read_simple_line() {
        let mock = Builder::new().read(b"+OK ready\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, "+OK ready\r\n");
    }

    #[tokio::test]
    async fn test_read_line_split_across_chunks() {
        let mock = Builder::new()
            .read(b"+OK re")
            .read(b"ady\r")
            .read(b"\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let line = framed.read_line().await.unwrap();
        assert_eq!(line, "+OK ready\r\n");
    }

    #[tokio::test]
    async fn test_multiline_terminator_split() {
        let mock = Builder::new()
            .read(b"1 abc\r\n2 def\r")
            .read(b"\n.")
            .read(b"\r\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let body = framed.read_until(MULTILINE_TERMINATOR).await.unwrap();
        assert_eq!(body, "1 abc\r\n2 def\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_trailing_bytes_kept_for_next_read() {
        let mock = Builder::new().read(b"+OK one\r\n+OK two\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "+OK one\r\n");
        assert_eq!(framed.read_line().await.unwrap(), "+OK two\r\n");
    }

    #[tokio::test]
    async fn test_read_body_after_status() {
        let mock = Builder::new()
            .read(b"+OK 2 messages\r\n1 a")
            .read(b"bc\r\n2 def\r\n.\r\n")
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "+OK 2 messages\r\n");
        assert_eq!(framed.read_body().await.unwrap(), "1 abc\r\n2 def\r\n.\r\n");
    }

    #[tokio::test]
    async fn test_read_empty_body_split_from_status() {
        let mock = Builder::new().read(b"+OK\r\n").read(b".\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        assert_eq!(framed.read_line().await.unwrap(), "+OK\r\n");
        assert_eq!(framed.read_body().await.unwrap(), ".\r\n");
    }

    #[tokio::test]
    async fn test_eof_is_transport_error() {
        let mock = Builder::new().read(b"+OK no end").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let err = framed.read_line().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
    }

    #[tokio::test(start_paused = true)]
    async fn test_read_timeout() {
        let mock = Builder::new()
            .read(b"+OK partial")
            .wait(Duration::from_secs(60))
            .build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        let err = framed.read_line().await.unwrap_err();
        assert!(matches!(err, Error::Timeout(d) if d == TIMEOUT));
    }

    #[tokio::test]
    async fn test_write() {
        let mock = Builder::new().write(b"UIDL\r\n").build();
        let mut framed = FramedStream::new(mock, TIMEOUT);

        framed.write(b"UIDL\r\n").await.unwrap();
    }

    /// Cuts `data` at the given offsets into consecutive chunks.
    fn chunk(data: &[u8], mut cuts: Vec<usize>) -> Vec<Vec<u8>> {
        cuts.retain(|&c| c > 0 && c < data.len());
        cuts.sort_unstable();
        cuts.dedup();

        let mut chunks = Vec::new();
        let mut start = 0;
        for cut in cuts {
            chunks.push(data[start..cut].to_vec());
            start = cut;
        }
        chunks.push(data[start..].to_vec());
        chunks
    }

    fn read_chunked(chunks: &[Vec<u8>], terminator: &[u8]) -> String {
        let mut builder = Builder::new();
        for c in chunks {
            builder.read(c);
        }
        let mut framed = FramedStream::new(builder.build(), TIMEOUT);
        tokio_test::block_on(framed.read_until(terminator)).unwrap()
    }

    proptest! {
        #[test]
        fn prop_single_line_survives_any_split(
            text in "[ -~]{0,60}",
            cuts in proptest::collection::vec(0usize..80, 0..8),
        ) {
            let line = format!("+OK {text}\r\n");
            let chunks = chunk(line.as_bytes(), cuts);
            prop_assert_eq!(read_chunked(&chunks, LINE_TERMINATOR), line);
        }

        #[test]
        fn prop_multiline_survives_any_split(
            lines in proptest::collection::vec("[a-z0-9 ]{1,20}", 0..6),
            cuts in proptest::collection::vec(0usize..200, 0..12),
        ) {
            let mut body = String::new();
            for line in &lines {
                body.push_str(line);
                body.push_str("\r\n");
            }
            let response = format!("+OK\r\n{body}.\r\n");
            let chunks = chunk(response.as_bytes(), cuts);
            // The status line is framed first, then the body
            let mut builder = Builder::new();
            for c in &chunks {
                builder.read(c);
            }
            let mut framed = FramedStream::new(builder.build(), TIMEOUT);
            let status = tokio_test::block_on(framed.read_line()).unwrap();
            prop_assert_eq!(status, "+OK\r\n");
            let rest = tokio_test::block_on(framed.read_body()).unwrap();
            prop_assert_eq!(rest, format!("{body}.\r\n"));
        }
    }
}
