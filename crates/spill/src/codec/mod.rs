//! Integer and block codecs shared with on-disk formats.
//!
//! - [`varint`]: 7b/8b variable-length unsigned integers
//! - [`compress`]: length-prefixed zlib block compression

pub mod compress;
pub mod varint;

pub use compress::{compress, decompress, CompressionMethod, MIN_COMPRESS_SIZE};
pub use varint::{decode_uint, encode_uint, encode_uint_to, MAX_ENCODED_UINT_LEN};
