//! Alopex Spill - spill-to-file byte buffers
//!
//! This crate provides an unbounded byte FIFO that keeps recent content in
//! memory and overflows to a temporary file once a memory budget is reached.
//!
//! # Components
//!
//! - [`SpillBuffer`]: Block FIFO with pull (`read`) and push (`process`) reads
//! - [`SpillReader`]: Caller-sized copies and single-byte reads
//! - [`SpillStream`]: `std::io::Read` / `std::io::Write` adaptor
//! - [`codec`]: 7b/8b integer codec and zlib block compression
//!
//! # Example
//!
//! ```rust,ignore
//! use alopex_spill::{SpillBuffer, SpillConfig};
//!
//! // Keep up to 1 MB in memory, spill the rest under /var/tmp
//! let config = SpillConfig::new(16 * 1024, 1024 * 1024).with_dirpath("/var/tmp");
//! let mut buf = SpillBuffer::with_config(config)?;
//!
//! buf.write(&payload)?;
//!
//! // Pull chunks back out in write order
//! while let Some(chunk) = buf.read()? {
//!     sink.write_all(chunk)?;
//! }
//! ```

#![deny(missing_docs)]

pub mod codec;
pub mod error;
pub mod spillbuf;

pub use codec::CompressionMethod;
pub use error::{Result, SpillError};
pub use spillbuf::{SpillBuffer, SpillConfig, SpillReader, SpillStream};
