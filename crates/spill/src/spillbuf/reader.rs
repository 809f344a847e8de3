//! Caller-sized reads on top of a spill buffer.
//!
//! [`SpillBuffer::read`] hands out whole chunks that must be consumed at
//! once. [`SpillReader`] copies into a caller buffer instead and keeps the
//! unconsumed tail of a chunk in a save area for the next call.

use super::{SpillBuffer, SpillConfig};
use crate::error::{Result, SpillError};

/// Stream-style reader that owns a [`SpillBuffer`].
#[derive(Debug)]
pub struct SpillReader {
    buffer: SpillBuffer,
    /// Leftover bytes of the last chunk pulled from `buffer`.
    save: Vec<u8>,
    /// Read position within `save`.
    save_pos: usize,
}

impl SpillReader {
    /// Creates a spill buffer with default policies and a reader for it.
    ///
    /// # Errors
    ///
    /// Returns an error if `blocksize` is zero.
    pub fn new(blocksize: usize, maxsize: usize) -> Result<Self> {
        Ok(Self::from(SpillBuffer::new(blocksize, maxsize)?))
    }

    /// Creates a reader over a buffer built from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: SpillConfig) -> Result<Self> {
        Ok(Self::from(SpillBuffer::with_config(config)?))
    }

    /// Returns the underlying buffer.
    pub fn buffer(&self) -> &SpillBuffer {
        &self.buffer
    }

    /// Consumes the reader, returning the underlying buffer.
    ///
    /// Bytes held in the save area are lost.
    pub fn into_inner(self) -> SpillBuffer {
        self.buffer
    }

    /// Returns the number of unread bytes, including saved ones.
    pub fn size(&self) -> u64 {
        self.buffer.size() + self.saved_len() as u64
    }

    /// Returns true if there is nothing left to read.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    fn saved_len(&self) -> usize {
        self.save.len() - self.save_pos
    }

    /// Reads up to `dst.len()` bytes into `dst`.
    ///
    /// Returns the number of bytes copied. This is zero only once the buffer
    /// is exhausted, and less than `dst.len()` only when the content ran out.
    ///
    /// # Errors
    ///
    /// Returns [`SpillError::InvalidArgument`] if `dst` is empty, or any error
    /// from reading the underlying buffer.
    pub fn read(&mut self, dst: &mut [u8]) -> Result<usize> {
        if dst.is_empty() {
            return Err(SpillError::InvalidArgument(
                "read length must be non-zero".to_string(),
            ));
        }

        let mut copied = self.drain_saved(dst);

        while copied < dst.len() {
            let Some(chunk) = self.buffer.read()? else {
                break;
            };

            let n = (dst.len() - copied).min(chunk.len());
            dst[copied..copied + n].copy_from_slice(&chunk[..n]);
            copied += n;

            if n < chunk.len() {
                debug_assert_eq!(self.save.len(), self.save_pos);
                self.save.clear();
                self.save.extend_from_slice(&chunk[n..]);
                self.save_pos = 0;
            }
        }

        Ok(copied)
    }

    fn drain_saved(&mut self, dst: &mut [u8]) -> usize {
        let n = self.saved_len().min(dst.len());
        if n == 0 {
            return 0;
        }

        dst[..n].copy_from_slice(&self.save[self.save_pos..self.save_pos + n]);
        self.save_pos += n;
        if self.save_pos == self.save.len() {
            self.save.clear();
            self.save_pos = 0;
        }
        n
    }

    /// Reads a single byte.
    ///
    /// # Errors
    ///
    /// Returns [`SpillError::UnexpectedEof`] if the buffer is exhausted.
    pub fn getc(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        match self.read(&mut byte)? {
            0 => Err(SpillError::UnexpectedEof),
            _ => Ok(byte[0]),
        }
    }

    /// Writes `data` into the underlying buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if the buffer write fails.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.buffer.write(data)
    }
}

impl From<SpillBuffer> for SpillReader {
    fn from(buffer: SpillBuffer) -> Self {
        Self {
            buffer,
            save: Vec::new(),
            save_pos: 0,
        }
    }
}
