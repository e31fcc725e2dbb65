//! Newline-agnostic line decoding for child process output.
//!
//! Pack tools print with whatever line endings the platform (or their
//! progress renderer) prefers: `\n`, `\r\n`, or a bare `\r` used to redraw
//! the current line. [`LineDecoder`] treats all three as terminators and is
//! used as a [`tokio_util::codec::Decoder`] over the child's pipes.

use std::io;

use bytes::{Buf, Bytes, BytesMut};
use tokio_util::codec::Decoder;

const CR: u8 = b'\r';
const LF: u8 = b'\n';

/// Splits a byte stream into lines with terminators stripped.
///
/// A `\r` that ends the currently available data may be the first half of a
/// `\r\n` pair. The line it terminates is emitted right away and
/// `trailing_cr` remembers to swallow an `\n` at the start of the next chunk.
#[derive(Debug, Default, Clone)]
pub struct LineDecoder {
    trailing_cr: bool,
}

impl LineDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a carriage return at the end of the last chunk is still unresolved.
    pub fn has_trailing_cr(&self) -> bool {
        self.trailing_cr
    }

    /// Decode a complete in-memory buffer, flushing at the end.
    pub fn decode_all(input: &[u8]) -> Vec<Bytes> {
        Self::decode_chunks([input])
    }

    /// Decode a sequence of chunks as if they arrived one after another on a pipe.
    pub fn decode_chunks<'a, I>(chunks: I) -> Vec<Bytes>
    where
        I: IntoIterator<Item = &'a [u8]>,
    {
        let mut decoder = Self::new();
        let mut buf = BytesMut::new();
        let mut lines = Vec::new();

        for chunk in chunks {
            buf.extend_from_slice(chunk);
            while let Some(line) = decoder.next_line(&mut buf) {
                lines.push(line);
            }
        }
        if let Some(line) = decoder.flush(&mut buf) {
            lines.push(line);
        }
        lines
    }

    fn next_line(&mut self, src: &mut BytesMut) -> Option<Bytes> {
        if self.trailing_cr && !src.is_empty() {
            if src[0] == LF {
                src.advance(1);
            }
            self.trailing_cr = false;
        }

        let pos = src.iter().position(|&b| b == CR || b == LF)?;
        let line = src.split_to(pos).freeze();

        if src[0] == CR {
            match src.get(1) {
                Some(&LF) => src.advance(2),
                Some(_) => src.advance(1),
                None => {
                    src.advance(1);
                    self.trailing_cr = true;
                }
            }
        } else {
            src.advance(1);
        }

        Some(line)
    }

    fn flush(&mut self, src: &mut BytesMut) -> Option<Bytes> {
        self.trailing_cr = false;
        if src.is_empty() {
            None
        } else {
            Some(src.split().freeze())
        }
    }
}

impl Decoder for LineDecoder {
    type Item = Bytes;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        Ok(self.next_line(src))
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.next_line(src) {
            Some(line) => Ok(Some(line)),
            None => Ok(self.flush(src)),
        }
    }
}
