//! Length-capped line framing over an async byte stream.

use std::io;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};

/// Longest accepted line in bytes, terminator excluded.
pub const MAX_LINE_LEN: usize = 64 * 1024;

/// One unit read from the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    /// A line without its `\n` (or `\r\n`) terminator. Not checked for UTF-8.
    Line(&'a [u8]),
    /// A line over the limit. Its bytes were read and discarded.
    TooLong,
}

/// Reads newline-terminated frames without buffering more than the limit.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buf: Vec<u8>,
    max_len: usize,
}

impl<R: AsyncBufRead + Unpin> LineReader<R> {
    /// Wrap `reader`, accepting lines of at most `max_len` bytes.
    pub const fn new(reader: R, max_len: usize) -> Self {
        Self {
            reader,
            buf: Vec::new(),
            max_len,
        }
    }

    /// Read the next frame. `None` at end of stream.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error.
    pub async fn next_frame(&mut self) -> io::Result<Option<Frame<'_>>> {
        if self.read_chunk().await? == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
            return Ok(Some(Frame::Line(&self.buf)));
        }
        if self.buf.len() <= self.max_len {
            // Last line of the stream, unterminated
            return Ok(Some(Frame::Line(&self.buf)));
        }

        while self.read_chunk().await? > 0 && self.buf.last() != Some(&b'\n') {}
        self.buf.clear();
        Ok(Some(Frame::TooLong))
    }

    /// Read up to one byte past the limit, stopping after a newline.
    async fn read_chunk(&mut self) -> io::Result<usize> {
        self.buf.clear();
        let limit = u64::try_from(self.max_len).unwrap_or(u64::MAX).saturating_add(1);
        (&mut self.reader).take(limit).read_until(b'\n', &mut self.buf).await
    }
}
