use std::fs::File;
use std::io::{ErrorKind, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use bytes::Bytes;

use crate::error::CacheError;

/// Trait for positional reads from a bundle file.
///
/// Bundle readers only ever need "give me `len` bytes at `offset`", so the
/// parsers are written against this trait and work the same over files on
/// disk and in-memory buffers.
pub trait RangeReader: Send + Sync {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns `CacheError::Truncated` if the range runs past the end of the
    /// resource.
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, CacheError>;

    /// Get the total size of the resource in bytes.
    fn size(&self) -> u64;

    /// Get a unique identifier for this resource (for logging and errors).
    fn identifier(&self) -> &str;
}

/// Build the `Truncated` error for a range that does not fit in `reader`.
pub(crate) fn truncated<R: RangeReader + ?Sized>(reader: &R, offset: u64, len: u64) -> CacheError {
    CacheError::Truncated {
        source_id: reader.identifier().to_string(),
        offset,
        expected: len,
        actual: reader.size().saturating_sub(offset).min(len),
    }
}

// =============================================================================
// FileRangeReader
// =============================================================================

/// A read-only bundle file opened for a single tile request.
///
/// The handle is closed when the reader is dropped, so no descriptors outlive
/// the request that opened them.
#[derive(Debug)]
pub struct FileRangeReader {
    file: File,
    size: u64,
    identifier: String,
}

impl FileRangeReader {
    /// Open `path` read-only.
    ///
    /// Returns `Ok(None)` when the file does not exist: sparse caches simply
    /// omit bundles with no tiles, and callers treat that as a missing tile.
    pub fn open(path: impl AsRef<Path>) -> Result<Option<Self>, CacheError> {
        let path = path.as_ref();
        let identifier = path.display().to_string();

        let file = match File::open(path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(CacheError::io(&identifier, &e)),
        };

        let size = file
            .metadata()
            .map_err(|e| CacheError::io(&identifier, &e))?
            .len();

        Ok(Some(Self {
            file,
            size,
            identifier,
        }))
    }

    /// Path of the opened file.
    pub fn path(&self) -> PathBuf {
        PathBuf::from(&self.identifier)
    }
}

impl RangeReader for FileRangeReader {
    fn read_exact_at(&self, offset: u64, len: usize) -> Result<Bytes, CacheError> {
        let end = offset.checked_add(len as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(truncated(self, offset, len as u64));
        }

        let mut file = &self.file;
        file.seek(SeekFrom::Start(offset))
            .map_err(|e| CacheError::io(&self.identifier, &e))?;

        let mut buf = vec![0u8; len];
        match file.read_exact(&mut buf) {
            Ok(()) => Ok(Bytes::from(buf)),
            // The file shrank after it was opened
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => {
                Err(truncated(self, offset, len as u64))
            }
            Err(e) => Err(CacheError::io(&self.identifier, &e)),
        }
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn identifier(&self) -> &str {
        &self.identifier
    }
}
