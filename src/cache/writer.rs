//! Transactional sink for the records of one pass.
//!
//! When persistence is requested the sink streams records into a temporary
//! file beside the target cache file, named after the cache file plus a
//! random suffix so the final rename stays within one filesystem. The only
//! valid end states of the cache file are "content identical to the
//! previous successful pass" or "content equal to the fully-completed new
//! pass"; a partial file is never visible under the canonical name.

use std::io::{Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use super::CacheError;

/// Capability-checked output sink for one merge pass.
///
/// The [`Null`](CacheSink::Null) variant accepts all writes and performs no
/// I/O; it is selected when the caller does not request persistence and for
/// directory listings, whose previews are never cached.
pub enum CacheSink {
    /// Discard sink with zero filesystem side effect.
    Null,
    /// Real sink with atomic-replace semantics.
    File(FileSink),
}

/// File-backed sink state.
pub struct FileSink {
    temp: NamedTempFile,
    dest: PathBuf,
}

impl CacheSink {
    /// Create a sink that discards everything.
    #[must_use]
    pub fn null() -> Self {
        Self::Null
    }

    /// Create a file-backed sink targeting `folder/cache_name`.
    ///
    /// Opens the temporary file and writes the opening bracket line
    /// immediately; records follow as the pass progresses.
    pub fn file(folder: &Path, cache_name: &str) -> Result<Self, CacheError> {
        let dest = folder.join(cache_name);
        let io_err = |source| CacheError::Io {
            path: dest.clone(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(cache_name)
            .tempfile_in(folder)
            .map_err(io_err)?;
        temp.write_all(b"[\n").map_err(io_err)?;
        log::debug!("Opened cache temp file {}", temp.path().display());

        Ok(Self::File(FileSink { temp, dest }))
    }

    /// Whether this sink will touch the filesystem on commit.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        matches!(self, Self::File(_))
    }

    /// Append one serialized record line.
    pub fn write_record(&mut self, json: &str) -> Result<(), CacheError> {
        if let Self::File(sink) = self {
            let io_err = |source| CacheError::Io {
                path: sink.dest.clone(),
                source,
            };
            sink.temp.write_all(json.as_bytes()).map_err(io_err)?;
            sink.temp.write_all(b",\n").map_err(io_err)?;
        }
        Ok(())
    }

    /// Finish the pass normally.
    ///
    /// A dirty pass closes the JSON array and atomically renames the
    /// temporary file over the cache file. A clean pass discards the
    /// temporary file, leaving the previous cache file's modification time
    /// untouched so that repeated unchanged invocations are idempotent at
    /// the metadata level.
    pub fn finish(self, dirty: bool) -> Result<(), CacheError> {
        match self {
            Self::Null => Ok(()),
            Self::File(sink) => {
                if dirty {
                    sink.commit()
                } else {
                    log::debug!("Pass was clean, keeping {}", sink.dest.display());
                    // Dropping the temp file deletes it.
                    Ok(())
                }
            }
        }
    }
}

impl FileSink {
    /// Close the array and rename over the cache file in one operation.
    ///
    /// Only called on a dirty pass, which implies at least one record line
    /// was written: the seek lands on that record's trailing comma, which
    /// becomes the closing bracket.
    fn commit(mut self) -> Result<(), CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.dest.clone(),
            source,
        };
        self.temp
            .as_file_mut()
            .seek(SeekFrom::End(-2))
            .map_err(&io_err)?;
        self.temp.write_all(b"]").map_err(&io_err)?;
        self.temp.flush().map_err(&io_err)?;

        log::debug!("Replacing cache file {}", self.dest.display());
        self.temp
            .persist(&self.dest)
            .map_err(|e| CacheError::Persist {
                path: self.dest,
                source: e.error,
            })?;
        Ok(())
    }
}
