//! `std::io` adaptor for spill buffers.

use super::{SpillBuffer, SpillReader};
use std::io::{self, Read, Write};

/// A spill buffer exposed as a readable and writable byte stream.
///
/// Writes append to the FIFO; reads drain it in write order. A read returns
/// `Ok(0)` once the buffer is empty, and may return more data after later
/// writes.
#[derive(Debug)]
pub struct SpillStream {
    reader: SpillReader,
}

impl SpillStream {
    /// Wraps `buffer` in a stream.
    pub fn from_buffer(buffer: SpillBuffer) -> Self {
        Self {
            reader: SpillReader::from(buffer),
        }
    }

    /// Returns the reader backing this stream.
    pub fn reader(&self) -> &SpillReader {
        &self.reader
    }

    /// Consumes the stream, returning the reader.
    pub fn into_inner(self) -> SpillReader {
        self.reader
    }
}

impl From<SpillBuffer> for SpillStream {
    fn from(buffer: SpillBuffer) -> Self {
        Self::from_buffer(buffer)
    }
}

impl From<SpillReader> for SpillStream {
    fn from(reader: SpillReader) -> Self {
        Self { reader }
    }
}

impl Read for SpillStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        Ok(self.reader.read(buf)?)
    }
}

impl Write for SpillStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.reader.write(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
