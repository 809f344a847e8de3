//! Length-prefixed zlib block compression.
//!
//! # Format
//!
//! ```text
//! ┌──────────────────────────┬───────────────────────────────┐
//! │ original length (varint) │ raw bytes OR zlib stream      │
//! └──────────────────────────┴───────────────────────────────┘
//! ```
//!
//! The payload is stored raw when compression is disabled, when the input
//! is too small to be worth compressing, or when zlib would not make it
//! smaller. A decoder tells the two apart by comparing the remaining
//! payload length with the stored original length.

use super::varint::{decode_uint, encode_uint_to};
use crate::error::{Result, SpillError};
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use flate2::Compression;
use std::io::{Read, Write};

/// Inputs shorter than this are always stored raw.
pub const MIN_COMPRESS_SIZE: usize = 512;

/// Compression method and level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum CompressionMethod {
    /// No compression; a length prefix is still written.
    None = 0,
    /// Fastest zlib level.
    ZlibMin = 1,
    /// Default zlib level.
    #[default]
    ZlibDefault = 5,
    /// Best zlib compression.
    ZlibMax = 9,
}

impl CompressionMethod {
    /// Creates a CompressionMethod from its numeric code.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::None),
            1 => Some(Self::ZlibMin),
            5 => Some(Self::ZlibDefault),
            9 => Some(Self::ZlibMax),
            _ => None,
        }
    }

    /// Returns the zlib level, or `None` for uncompressed storage.
    pub fn level(self) -> Option<u32> {
        match self {
            Self::None => None,
            other => Some(other as u32),
        }
    }
}

impl TryFrom<u8> for CompressionMethod {
    type Error = SpillError;

    fn try_from(value: u8) -> Result<Self> {
        Self::from_u8(value).ok_or_else(|| {
            SpillError::InvalidArgument(format!("unknown compression method: {}", value))
        })
    }
}

/// Compresses `input` with `method`, replacing the contents of `out`.
///
/// # Errors
///
/// Returns [`SpillError::CompressionError`] if zlib fails.
pub fn compress(input: &[u8], out: &mut Vec<u8>, method: CompressionMethod) -> Result<()> {
    out.clear();
    encode_uint_to(out, input.len() as u64);
    let prefix_len = out.len();

    let level = match method.level() {
        Some(level) if input.len() >= MIN_COMPRESS_SIZE => level,
        _ => {
            out.extend_from_slice(input);
            return Ok(());
        }
    };

    let mut encoder = ZlibEncoder::new(std::mem::take(out), Compression::new(level));
    encoder
        .write_all(input)
        .map_err(|e| SpillError::CompressionError(e.to_string()))?;
    *out = encoder
        .finish()
        .map_err(|e| SpillError::CompressionError(e.to_string()))?;

    if out.len() - prefix_len >= input.len() {
        out.truncate(prefix_len);
        out.extend_from_slice(input);
    }
    Ok(())
}

/// Decompresses `input` into `out`, replacing its contents.
///
/// # Errors
///
/// Returns [`SpillError::DecompressionError`] if the length prefix is
/// missing, the zlib stream is corrupt, or the inflated size differs from the
/// stored one, and [`SpillError::SizeLimitExceeded`] if the stored size is
/// larger than `limit`.
pub fn decompress(input: &[u8], out: &mut Vec<u8>, limit: usize) -> Result<()> {
    let (len, prefix_len) = decode_uint(input)
        .ok_or_else(|| SpillError::DecompressionError("missing size prefix".to_string()))?;

    if len > limit as u64 {
        return Err(SpillError::SizeLimitExceeded { size: len, limit });
    }
    let len = len as usize;
    let payload = &input[prefix_len..];

    out.clear();
    if payload.len() == len {
        out.extend_from_slice(payload);
        return Ok(());
    }

    out.reserve(len);
    // One byte past the stored length is enough to detect oversized output.
    let mut decoder = ZlibDecoder::new(payload).take(len as u64 + 1);
    decoder
        .read_to_end(out)
        .map_err(|e| SpillError::DecompressionError(e.to_string()))?;

    if out.len() != len {
        return Err(SpillError::DecompressionError(format!(
            "size of uncompressed data ({}) does not match stored original length ({})",
            out.len(),
            len
        )));
    }
    Ok(())
}
