//! Spill-to-file buffer.
//!
//! A [`SpillBuffer`] is an unbounded byte FIFO. Content is held in memory
//! until a write would push the in-memory total past `maxsize`; such writes
//! are "spilled" to a temporary file instead. Readers always see the
//! earliest-written bytes first, whether they live in memory or on disk.
//!
//! # Reading
//!
//! ```text
//! read()    → pull one chunk (≤ blocksize) as a borrowed slice
//! process() → push chunks into a callback until it breaks or content runs out
//! ```
//!
//! A chunk returned by [`SpillBuffer::read`] borrows the buffer, so it must be
//! consumed before the next write, read or process call. For caller-sized
//! copies use [`SpillReader`]; for `std::io` integration use [`SpillStream`].
//!
//! # Spill file lifecycle
//!
//! The file is created on the first overflow. Once every spilled byte has
//! been read back it is closed (and removed, with `delete_on_close`); a later
//! overflow creates a fresh file. With `spill_all_contents` the buffer stays
//! in spill mode after the first overflow: every later write goes through the
//! file, and a drained file is reused instead of closed. A delete-on-close
//! file is truncated first; a persisted file keeps everything spilled to it.
//!
//! # Example
//!
//! ```rust,ignore
//! use alopex_spill::spillbuf::SpillBuffer;
//!
//! let mut buf = SpillBuffer::new(16, 1024)?;
//! buf.write(b"hello")?;
//! buf.write(b"world")?;
//!
//! while let Some(chunk) = buf.read()? {
//!     consume(chunk);
//! }
//! ```

pub mod blocks;
pub mod file;
pub mod reader;
pub mod stream;

pub use blocks::{Block, BlockQueue};
pub use file::SpillFile;
pub use reader::SpillReader;
pub use stream::SpillStream;

use crate::error::{Result, SpillError};
use std::fs::File;
use std::ops::ControlFlow;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default block size (16 KB).
pub const DEFAULT_BLOCK_SIZE: usize = 16 * 1024;

/// Default in-memory budget (128 KB).
pub const DEFAULT_MAX_SIZE: usize = 128 * 1024;

/// Configuration for spill buffer behavior.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpillConfig {
    /// Maximum chunk size for in-memory blocks and for reads.
    pub blocksize: usize,
    /// Soft cap on bytes held in memory. Zero spills every write.
    pub maxsize: usize,
    /// Remove the spill file from disk when it is closed.
    pub delete_on_close: bool,
    /// Route every write through the file once the first overflow happened.
    pub spill_all_contents: bool,
    /// Directory for spill files. Defaults to the system temp directory.
    pub dirpath: Option<PathBuf>,
}

impl Default for SpillConfig {
    fn default() -> Self {
        Self {
            blocksize: DEFAULT_BLOCK_SIZE,
            maxsize: DEFAULT_MAX_SIZE,
            delete_on_close: true,
            spill_all_contents: false,
            dirpath: None,
        }
    }
}

impl SpillConfig {
    /// Creates a configuration with the given sizes and default policies.
    pub fn new(blocksize: usize, maxsize: usize) -> Self {
        Self {
            blocksize,
            maxsize,
            ..Self::default()
        }
    }

    /// Sets whether closing the spill file removes it.
    pub fn with_delete_on_close(mut self, delete_on_close: bool) -> Self {
        self.delete_on_close = delete_on_close;
        self
    }

    /// Sets whether all content after the first overflow goes through the file.
    pub fn with_spill_all_contents(mut self, spill_all_contents: bool) -> Self {
        self.spill_all_contents = spill_all_contents;
        self
    }

    /// Sets the directory spill files are created in.
    pub fn with_dirpath(mut self, dirpath: impl Into<PathBuf>) -> Self {
        self.dirpath = Some(dirpath.into());
        self
    }

    /// Checks that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SpillError::InvalidArgument`] if `blocksize` is zero.
    pub fn validate(&self) -> Result<()> {
        if self.blocksize == 0 {
            return Err(SpillError::InvalidArgument(
                "blocksize must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Byte FIFO that overflows to a temporary file.
///
/// Not safe for concurrent use; every operation takes `&mut self`.
#[derive(Debug)]
pub struct SpillBuffer {
    config: SpillConfig,
    /// In-memory blocks.
    blocks: BlockQueue,
    /// Backing file, present between the first overflow and drain.
    spill: Option<SpillFile>,
    /// Stream offset of the next byte to be written.
    written: u64,
    /// Storage for the chunk most recently handed out by `read`.
    current: Vec<u8>,
}

impl SpillBuffer {
    /// Creates a spill buffer with default policies: delete on close, no
    /// forced spilling, system temp directory.
    ///
    /// # Errors
    ///
    /// Returns an error if `blocksize` is zero.
    pub fn new(blocksize: usize, maxsize: usize) -> Result<Self> {
        Self::with_config(SpillConfig::new(blocksize, maxsize))
    }

    /// Creates a spill buffer from a full configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn with_config(config: SpillConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            blocks: BlockQueue::new(),
            spill: None,
            written: 0,
            current: Vec::new(),
        })
    }

    /// Returns the buffer configuration.
    pub fn config(&self) -> &SpillConfig {
        &self.config
    }

    /// Returns the configured block size.
    pub fn blocksize(&self) -> usize {
        self.config.blocksize
    }

    /// Returns the configured in-memory budget.
    pub fn maxsize(&self) -> usize {
        self.config.maxsize
    }

    /// Returns the number of unread bytes, in memory and on disk.
    pub fn size(&self) -> u64 {
        let spilled = self.spill.as_ref().map_or(0, SpillFile::pending);
        self.blocks.memory_bytes() as u64 + spilled
    }

    /// Returns the number of unread bytes held in memory.
    pub fn memory_size(&self) -> u64 {
        self.blocks.memory_bytes() as u64
    }

    /// Returns true if there is nothing left to read.
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Returns the path of the current spill file, if one is open.
    pub fn filename(&self) -> Option<&Path> {
        self.spill.as_ref().map(SpillFile::path)
    }

    /// Returns the handle of the current spill file, if one is open.
    pub fn file(&self) -> Option<&File> {
        self.spill.as_ref().map(SpillFile::file)
    }

    /// Appends `data` to the buffer.
    ///
    /// The write lands in memory unless it would exceed `maxsize`, or the
    /// buffer is in spill-all mode, in which case it is appended to the
    /// spill file (created on demand).
    ///
    /// # Errors
    ///
    /// Returns an error if the spill file cannot be created or written. The
    /// buffer is left exactly as it was before the call.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let force_file = self.spill.is_some() && self.config.spill_all_contents;
        let overflow = self.blocks.memory_bytes() + data.len() > self.config.maxsize;

        if force_file || overflow {
            self.write_to_file(data)?;
        } else {
            let mut offset = self.written;
            for chunk in data.chunks(self.config.blocksize) {
                self.blocks.enqueue(offset, chunk.to_vec());
                offset += chunk.len() as u64;
            }
        }

        self.written += data.len() as u64;
        Ok(())
    }

    fn write_to_file(&mut self, data: &[u8]) -> Result<()> {
        let (mut spill, created) = match self.spill.take() {
            Some(spill) => (spill, false),
            None => {
                let spill = SpillFile::create(
                    self.config.dirpath.as_deref(),
                    self.config.delete_on_close,
                )?;
                debug!(
                    "Spilling at {} bytes in memory, {} byte write",
                    self.blocks.memory_bytes(),
                    data.len()
                );
                (spill, true)
            }
        };

        match spill.append(self.written, data) {
            Ok(()) => {
                self.spill = Some(spill);
                Ok(())
            }
            Err(e) => {
                if created {
                    spill.discard();
                } else {
                    self.spill = Some(spill);
                }
                Err(e)
            }
        }
    }

    /// Reads the next chunk of content.
    ///
    /// Returns `None` once the buffer is exhausted. Chunks are at most
    /// `blocksize` bytes and never span two writes that went to different
    /// storage. The slice must be fully consumed by the caller; it is only
    /// valid until the next call on this buffer.
    ///
    /// # Errors
    ///
    /// Returns an error if reading the spill file fails. The read position
    /// is unchanged in that case.
    pub fn read(&mut self) -> Result<Option<&[u8]>> {
        let next_spilled = self.spill.as_ref().and_then(SpillFile::next_offset);
        let from_memory = match (self.blocks.peek_head(), next_spilled) {
            (Some(block), Some(spilled)) => block.offset < spilled,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if from_memory {
            if let Some(block) = self.blocks.pop_head() {
                self.current = block.data;
                return Ok(Some(self.current.as_slice()));
            }
        }

        let Some(spill) = self.spill.as_mut() else {
            return Ok(None);
        };
        if spill
            .read_chunk(self.config.blocksize, &mut self.current)?
            .is_none()
        {
            return Ok(None);
        }
        if spill.is_drained() {
            self.finish_spill();
        }

        Ok(Some(self.current.as_slice()))
    }

    /// Closes a fully read spill file. In spill-all mode the file stays open:
    /// a temporary file is rewound, a persisted one keeps its content and is
    /// appended to.
    fn finish_spill(&mut self) {
        let Some(mut spill) = self.spill.take() else {
            return;
        };

        if self.config.spill_all_contents {
            if spill.is_persisted() {
                self.spill = Some(spill);
                return;
            }
            match spill.rewind() {
                Ok(()) => {
                    self.spill = Some(spill);
                    return;
                }
                Err(e) => warn!("Failed to rewind drained spill file: {:?}", e),
            }
        }
        spill.close();
    }

    /// Feeds chunks to `callback` until it breaks or the buffer runs dry.
    ///
    /// Returns `true` if all content was consumed, `false` if the callback
    /// asked to stop. A chunk handed to the callback counts as consumed
    /// whatever the callback returns.
    ///
    /// # Errors
    ///
    /// Returns the first error produced by a read or by the callback.
    pub fn process<F>(&mut self, mut callback: F) -> Result<bool>
    where
        F: FnMut(&[u8]) -> Result<ControlFlow<()>>,
    {
        loop {
            let Some(chunk) = self.read()? else {
                return Ok(true);
            };
            if callback(chunk)?.is_break() {
                return Ok(false);
            }
        }
    }
}
