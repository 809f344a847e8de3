//! Error and Result types for spill buffer operations.

use std::io;
use thiserror::Error;

/// A convenience `Result` type for spill buffer operations.
pub type Result<T> = std::result::Result<T, SpillError>;

/// The error type for spill buffer and codec operations.
#[derive(Debug, Error)]
pub enum SpillError {
    /// A caller supplied an argument the operation cannot accept.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A single-byte read found the buffer exhausted.
    #[error("Unexpected end of stream")]
    UnexpectedEof,

    /// Error during compression.
    #[error("Compression error: {0}")]
    CompressionError(String),

    /// Error during decompression.
    #[error("Decompression error: {0}")]
    DecompressionError(String),

    /// Decompressed content would be larger than the caller's limit.
    #[error("Decompressed size {size} exceeds limit {limit}")]
    SizeLimitExceeded {
        /// Size recorded in the compressed header.
        size: u64,
        /// Maximum size the caller accepts.
        limit: usize,
    },

    /// Underlying I/O error.
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
}

impl From<SpillError> for io::Error {
    fn from(err: SpillError) -> Self {
        match err {
            SpillError::IoError(e) => e,
            SpillError::InvalidArgument(msg) => io::Error::new(io::ErrorKind::InvalidInput, msg),
            SpillError::UnexpectedEof => {
                io::Error::new(io::ErrorKind::UnexpectedEof, SpillError::UnexpectedEof)
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        }
    }
}
