//! Incremental line splitting over byte chunks

use bytes::{Bytes, BytesMut};

/// Accumulates byte chunks and hands out complete `\n`-terminated lines
///
/// The returned lines exclude the `\n`; a trailing `\r` is left in place
/// and removed by the caller's whitespace trimming.
#[derive(Debug, Default)]
pub struct LineSplitter {
    buffer: BytesMut,
    /// Bytes at the front of `buffer` already known to contain no newline
    scanned: usize,
}

impl LineSplitter {
    /// Create an empty splitter
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a chunk of the body
    pub fn push(&mut self, chunk: &[u8]) {
        self.buffer.extend_from_slice(chunk);
    }

    /// Pop the next complete line, if one is buffered
    pub fn next_line(&mut self) -> Option<Bytes> {
        let offset = self.buffer[self.scanned..]
            .iter()
            .position(|&b| b == b'\n');

        match offset {
            Some(offset) => {
                let end = self.scanned + offset;
                let mut line = self.buffer.split_to(end + 1);
                line.truncate(end);
                self.scanned = 0;
                Some(line.freeze())
            }
            None => {
                self.scanned = self.buffer.len();
                None
            }
        }
    }

    /// Take whatever remains after the body ended without a final newline
    pub fn finish(&mut self) -> Option<Bytes> {
        self.scanned = 0;
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer.split().freeze())
        }
    }
}
