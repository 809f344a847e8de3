//! Backing file for spilled content.
//!
//! A [`SpillFile`] is an append-only temporary file with a sequential read
//! cursor. Every write routed to the file is tracked as an extent tagged
//! with its stream offset, so readers can tell whether an in-memory block
//! precedes the next spilled byte.

use crate::error::Result;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::{Builder, NamedTempFile};
use tracing::{debug, warn};

/// Spill file name prefix.
const SPILL_PREFIX: &str = "spillbuf";

/// Spill file name suffix.
const SPILL_SUFFIX: &str = ".tmp";

#[derive(Debug)]
enum Backing {
    /// Removed from disk when closed or dropped.
    Temp(NamedTempFile),
    /// Left on disk after close.
    Persisted { file: File, path: PathBuf },
}

/// A run of unread spilled bytes that arrived in a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extent {
    /// Stream offset of the first unread byte.
    offset: u64,
    /// Unread bytes remaining in this extent.
    len: u64,
}

/// Temporary file holding spilled buffer content.
#[derive(Debug)]
pub struct SpillFile {
    backing: Backing,
    /// Bytes appended so far.
    logical_length: u64,
    /// Bytes already consumed by reads.
    read_cursor: u64,
    extents: VecDeque<Extent>,
}

impl SpillFile {
    /// Creates a uniquely named spill file.
    ///
    /// # Arguments
    ///
    /// * `dir` - Directory for the file; the system temp directory when `None`
    /// * `delete_on_close` - Whether closing the file removes it from disk
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create(dir: Option<&Path>, delete_on_close: bool) -> Result<Self> {
        let dir = dir.map(Path::to_path_buf).unwrap_or_else(std::env::temp_dir);
        let temp = Builder::new()
            .prefix(SPILL_PREFIX)
            .suffix(SPILL_SUFFIX)
            .tempfile_in(&dir)?;

        let backing = if delete_on_close {
            Backing::Temp(temp)
        } else {
            let (file, path) = temp.keep().map_err(|e| e.error)?;
            Backing::Persisted { file, path }
        };

        let spill = Self {
            backing,
            logical_length: 0,
            read_cursor: 0,
            extents: VecDeque::new(),
        };
        debug!("Created spill file: {}", spill.path().display());
        Ok(spill)
    }

    /// Returns the path of the spill file.
    pub fn path(&self) -> &Path {
        match &self.backing {
            Backing::Temp(temp) => temp.path(),
            Backing::Persisted { path, .. } => path,
        }
    }

    /// Returns the open file handle.
    pub fn file(&self) -> &File {
        match &self.backing {
            Backing::Temp(temp) => temp.as_file(),
            Backing::Persisted { file, .. } => file,
        }
    }

    fn file_mut(&mut self) -> &mut File {
        match &mut self.backing {
            Backing::Temp(temp) => temp.as_file_mut(),
            Backing::Persisted { file, .. } => file,
        }
    }

    /// Returns true if the file stays on disk after close.
    pub fn is_persisted(&self) -> bool {
        matches!(self.backing, Backing::Persisted { .. })
    }

    /// Returns the number of bytes appended to the file.
    pub fn logical_length(&self) -> u64 {
        self.logical_length
    }

    /// Returns the number of bytes already read back.
    pub fn read_cursor(&self) -> u64 {
        self.read_cursor
    }

    /// Returns the number of bytes appended but not yet read.
    pub fn pending(&self) -> u64 {
        self.logical_length - self.read_cursor
    }

    /// Returns true once every appended byte has been read.
    pub fn is_drained(&self) -> bool {
        self.read_cursor == self.logical_length
    }

    /// Returns the stream offset of the next unread spilled byte.
    pub fn next_offset(&self) -> Option<u64> {
        self.extents.front().map(|extent| extent.offset)
    }

    /// Appends `data`, written at stream offset `offset`, to the end of the file.
    ///
    /// Either all bytes are appended or none are: on failure the file is
    /// truncated back to its previous length and no counter moves.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or writing fails.
    pub fn append(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }

        let start = self.logical_length;
        let file = self.file_mut();
        if let Err(e) = write_at(file, start, data) {
            if let Err(trunc) = file.set_len(start) {
                warn!(
                    "Failed to truncate spill file after partial append: {:?}",
                    trunc
                );
            }
            return Err(e.into());
        }

        let len = data.len() as u64;
        self.logical_length += len;
        self.extents.push_back(Extent { offset, len });
        Ok(())
    }

    /// Reads the next chunk of at most `max` bytes into `dst`.
    ///
    /// A chunk never crosses an extent boundary. Returns the stream offset of
    /// the chunk, or `None` if nothing is pending. The read cursor advances
    /// only after `dst` has been filled.
    ///
    /// # Errors
    ///
    /// Returns an error if seeking or reading fails.
    pub fn read_chunk(&mut self, max: usize, dst: &mut Vec<u8>) -> Result<Option<u64>> {
        let Some(extent) = self.extents.front().copied() else {
            return Ok(None);
        };

        let n = extent.len.min(max as u64) as usize;
        dst.clear();
        dst.resize(n, 0);

        let cursor = self.read_cursor;
        let file = self.file_mut();
        file.seek(SeekFrom::Start(cursor))?;
        file.read_exact(dst)?;

        self.read_cursor += n as u64;
        if let Some(front) = self.extents.front_mut() {
            front.offset += n as u64;
            front.len -= n as u64;
            if front.len == 0 {
                self.extents.pop_front();
            }
        }
        Ok(Some(extent.offset))
    }

    /// Discards the file's content so it can be reused from offset zero.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be truncated.
    pub fn rewind(&mut self) -> Result<()> {
        debug_assert!(self.is_drained());
        let file = self.file_mut();
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        self.logical_length = 0;
        self.read_cursor = 0;
        self.extents.clear();
        debug!("Rewound spill file: {}", self.path().display());
        Ok(())
    }

    /// Closes the file, removing it from disk when it was created with
    /// `delete_on_close`. Errors are logged, never returned.
    pub fn close(self) {
        match self.backing {
            Backing::Temp(temp) => {
                let path = temp.path().to_path_buf();
                match temp.close() {
                    Ok(()) => debug!("Removed spill file: {}", path.display()),
                    Err(e) => warn!("Failed to remove spill file {}: {:?}", path.display(), e),
                }
            }
            Backing::Persisted { file, path } => {
                drop(file);
                debug!("Closed spill file: {}", path.display());
            }
        }
    }

    /// Closes the file and removes it from disk whatever its backing.
    ///
    /// Used for a file that never received content. Errors are ignored.
    pub fn discard(self) {
        let path = self.path().to_path_buf();
        match self.backing {
            Backing::Temp(temp) => {
                let _ = temp.close();
            }
            Backing::Persisted { file, path } => {
                drop(file);
                let _ = std::fs::remove_file(&path);
            }
        }
        debug!("Discarded spill file: {}", path.display());
    }

    /// Opens an existing file read-only with its whole content pending at
    /// stream offset `offset`, so appends fail.
    #[cfg(test)]
    pub(crate) fn open_read_only(path: &Path, offset: u64) -> Result<Self> {
        let file = File::open(path)?;
        let len = file.metadata()?.len();
        let mut extents = VecDeque::new();
        if len > 0 {
            extents.push_back(Extent { offset, len });
        }
        Ok(Self {
            backing: Backing::Persisted {
                file,
                path: path.to_path_buf(),
            },
            logical_length: len,
            read_cursor: 0,
            extents,
        })
    }
}

fn write_at(file: &mut File, pos: u64, data: &[u8]) -> io::Result<()> {
    file.seek(SeekFrom::Start(pos))?;
    file.write_all(data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_in_dir() {
        let temp_dir = TempDir::new().unwrap();
        let spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();

        assert!(spill.path().starts_with(temp_dir.path()));
        assert!(spill.path().exists());
        let name = spill.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with(SPILL_PREFIX));
        assert!(spill.is_drained());
        assert_eq!(spill.next_offset(), None);
    }

    #[test]
    fn test_append_and_read_chunks() {
        let temp_dir = TempDir::new().unwrap();
        let mut spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();

        spill.append(0, b"ABCDEFGHI").unwrap();
        spill.append(9, b"JKL").unwrap();
        assert_eq!(spill.logical_length(), 12);
        assert_eq!(spill.pending(), 12);

        let mut chunks = Vec::new();
        let mut dst = Vec::new();
        while let Some(offset) = spill.read_chunk(4, &mut dst).unwrap() {
            chunks.push((offset, String::from_utf8(dst.clone()).unwrap()));
        }

        assert_eq!(
            chunks,
            vec![
                (0, "ABCD".to_string()),
                (4, "EFGH".to_string()),
                (8, "I".to_string()),
                (9, "JKL".to_string()),
            ]
        );
        assert!(spill.is_drained());
        assert_eq!(spill.read_cursor(), 12);
    }

    #[test]
    fn test_next_offset_tracks_extents() {
        let temp_dir = TempDir::new().unwrap();
        let mut spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();

        spill.append(5, b"xyz").unwrap();
        spill.append(20, b"uv").unwrap();
        assert_eq!(spill.next_offset(), Some(5));

        let mut dst = Vec::new();
        spill.read_chunk(2, &mut dst).unwrap();
        assert_eq!(spill.next_offset(), Some(7));
        spill.read_chunk(2, &mut dst).unwrap();
        assert_eq!(dst, b"z");
        assert_eq!(spill.next_offset(), Some(20));
    }

    #[test]
    fn test_close_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();
        let path = spill.path().to_path_buf();

        spill.close();
        assert!(!path.exists());
    }

    #[test]
    fn test_drop_removes_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = {
            let mut spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();
            spill.append(0, b"data").unwrap();
            spill.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_persisted_file_survives_close() {
        let temp_dir = TempDir::new().unwrap();
        let mut spill = SpillFile::create(Some(temp_dir.path()), false).unwrap();
        spill.append(0, b"keep me").unwrap();
        let path = spill.path().to_path_buf();

        spill.close();
        assert_eq!(std::fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn test_rewind_resets_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();

        spill.append(0, b"abcd").unwrap();
        let mut dst = Vec::new();
        spill.read_chunk(8, &mut dst).unwrap();
        spill.rewind().unwrap();

        assert_eq!(spill.logical_length(), 0);
        assert_eq!(spill.read_cursor(), 0);
        assert_eq!(spill.file().metadata().unwrap().len(), 0);

        spill.append(4, b"ef").unwrap();
        spill.read_chunk(8, &mut dst).unwrap();
        assert_eq!(dst, b"ef");
    }

    #[test]
    fn test_failed_append_leaves_file_unchanged() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("readonly.tmp");
        std::fs::write(&path, b"abc").unwrap();

        let mut spill = SpillFile::open_read_only(&path, 7).unwrap();
        assert!(spill.append(10, b"defg").is_err());

        assert_eq!(spill.logical_length(), 3);
        assert_eq!(spill.pending(), 3);
        assert_eq!(spill.next_offset(), Some(7));
        assert_eq!(std::fs::metadata(&path).unwrap().len(), 3);

        let mut dst = Vec::new();
        assert_eq!(spill.read_chunk(8, &mut dst).unwrap(), Some(7));
        assert_eq!(dst, b"abc");
        assert!(spill.is_drained());
    }

    #[test]
    fn test_discard_removes_persisted_file() {
        let temp_dir = TempDir::new().unwrap();
        let spill = SpillFile::create(Some(temp_dir.path()), false).unwrap();
        assert!(spill.is_persisted());
        let path = spill.path().to_path_buf();

        spill.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_removes_temp_file() {
        let temp_dir = TempDir::new().unwrap();
        let spill = SpillFile::create(Some(temp_dir.path()), true).unwrap();
        assert!(!spill.is_persisted());
        let path = spill.path().to_path_buf();

        spill.discard();
        assert!(!path.exists());
    }

    #[test]
    fn test_missing_dir_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("does-not-exist");
        assert!(SpillFile::create(Some(missing.as_path()), true).is_err());
    }
}
