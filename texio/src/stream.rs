//! Markable byte stream shared by decoders during dispatch.
//!
//! Decoders that probe a stream for a magic number must leave it untouched
//! when they decline it, so the next decoder sees the same bytes. A
//! [`TextureStream`] wraps any reader and records everything read after
//! [`mark`](TextureStream::mark) so that [`reset`](TextureStream::reset) can
//! replay it.
//!
//! # Example
//!
//! ```
//! use std::io::Read;
//! use texio::stream::TextureStream;
//!
//! let mut stream = TextureStream::new(&b"\x01\xdaSGI"[..]);
//! stream.mark();
//! let mut magic = [0u8; 2];
//! stream.read_exact(&mut magic).unwrap();
//! stream.reset().unwrap();
//! assert_eq!(stream.position(), 0);
//! ```

use std::io::{self, Read};

/// A buffered reader with mark/reset support and position tracking.
pub struct TextureStream<'a> {
    inner: Box<dyn Read + 'a>,
    /// Bytes pulled from `inner` that may still be replayed or consumed.
    buffer: Vec<u8>,
    /// Index of the next unread byte in `buffer`.
    cursor: usize,
    /// Index in `buffer` that `reset` rewinds to.
    mark: Option<usize>,
    position: u64,
}

impl<'a> TextureStream<'a> {
    /// Wrap a reader.
    pub fn new<R: Read + 'a>(reader: R) -> Self {
        Self {
            inner: Box::new(reader),
            buffer: Vec::new(),
            cursor: 0,
            mark: None,
            position: 0,
        }
    }

    /// Number of bytes consumed so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Remember the current position. Replaces any earlier mark.
    pub fn mark(&mut self) {
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
        self.mark = Some(0);
    }

    /// Rewind to the last mark. The mark stays valid, so a stream can be
    /// reset more than once.
    pub fn reset(&mut self) -> io::Result<()> {
        let mark = self.mark.ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, "reset called without a mark")
        })?;
        self.position -= (self.cursor - mark) as u64;
        self.cursor = mark;
        Ok(())
    }

    /// Drop the mark; bytes already replayed are released.
    pub fn clear_mark(&mut self) {
        self.mark = None;
        self.buffer.drain(..self.cursor);
        self.cursor = 0;
    }

    /// Whether a mark is currently set.
    pub fn is_marked(&self) -> bool {
        self.mark.is_some()
    }

    /// Stream position that [`reset`](TextureStream::reset) rewinds to.
    pub fn marked_position(&self) -> Option<u64> {
        self.mark
            .map(|mark| self.position - (self.cursor - mark) as u64)
    }

    /// Mark the current position while keeping an earlier mark recoverable.
    ///
    /// Returns the earlier mark's position, to be handed back to
    /// [`restore_mark`](TextureStream::restore_mark) once the nested probe is
    /// done. Bytes read since the earlier mark stay buffered.
    pub fn mark_nested(&mut self) -> Option<u64> {
        let outer = self.marked_position();
        if outer.is_some() {
            self.mark = Some(self.cursor);
        } else {
            self.mark();
        }
        outer
    }

    /// Reinstate a mark returned by [`mark_nested`](TextureStream::mark_nested).
    /// `None` clears the mark.
    ///
    /// Returns `false` if the bytes at `position` were discarded in the
    /// meantime; the stream is then left unmarked.
    pub fn restore_mark(&mut self, position: Option<u64>) -> bool {
        let Some(position) = position else {
            self.clear_mark();
            return true;
        };
        let origin = self.position - self.cursor as u64;
        if position < origin || position > self.position {
            self.mark = None;
            return false;
        }
        self.mark = Some((position - origin) as usize);
        true
    }

    /// Look at up to `len` upcoming bytes without consuming them.
    ///
    /// Returns fewer than `len` bytes only at end of input.
    pub fn peek(&mut self, len: usize) -> io::Result<&[u8]> {
        let mut chunk = [0u8; 512];
        while self.buffer.len() - self.cursor < len {
            let want = (len - (self.buffer.len() - self.cursor)).min(chunk.len());
            let n = match self.inner.read(&mut chunk[..want]) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            if n == 0 {
                break;
            }
            self.buffer.extend_from_slice(&chunk[..n]);
        }
        let end = (self.cursor + len).min(self.buffer.len());
        Ok(&self.buffer[self.cursor..end])
    }

    /// Read everything up to end of input.
    pub fn read_remaining(&mut self) -> io::Result<Vec<u8>> {
        let mut data = Vec::new();
        self.read_to_end(&mut data)?;
        Ok(data)
    }
}

impl Read for TextureStream<'_> {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if out.is_empty() {
            return Ok(0);
        }

        if self.cursor < self.buffer.len() {
            let n = out.len().min(self.buffer.len() - self.cursor);
            out[..n].copy_from_slice(&self.buffer[self.cursor..self.cursor + n]);
            self.cursor += n;
            self.position += n as u64;
            if self.mark.is_none() && self.cursor == self.buffer.len() {
                self.buffer.clear();
                self.cursor = 0;
            }
            return Ok(n);
        }

        let n = self.inner.read(out)?;
        if self.mark.is_some() {
            self.buffer.extend_from_slice(&out[..n]);
            self.cursor += n;
        }
        self.position += n as u64;
        Ok(n)
    }
}

impl std::fmt::Debug for TextureStream<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextureStream")
            .field("position", &self.position)
            .field("buffered", &(self.buffer.len() - self.cursor))
            .field("marked", &self.mark.is_some())
            .finish()
    }
}
