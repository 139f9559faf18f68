//! On-disk thumbnail cache for thumbflow.
//!
//! The cache is a JSON array stored inside the directory it describes
//! (default name `.thumbs.json`), one record per physical line for
//! human-diffability. Every element carries a trailing comma except the
//! last, where the comma is overwritten with the closing `]` at commit
//! time, so the whole file always parses as ordinary JSON.
//!
//! # Architecture
//!
//! * [`reader`]: lazy line-oriented parsing of a previously written cache
//!   file, terminated by a sentinel record.
//! * [`writer`]: a sink that streams the records of one pass into a
//!   uniquely-suffixed temporary file and atomically renames it over the
//!   cache file on a dirty completion, or discards it otherwise.
//!
//! # Invalidation
//!
//! The cache is replaced wholesale (never patched in place) whenever at
//! least one entry changed; an unchanged pass leaves the previous file's
//! metadata untouched.

pub mod reader;
pub mod writer;

use std::path::PathBuf;

pub use reader::KnownRecords;
pub use writer::CacheSink;

/// Errors that can occur while reading or writing the cache file.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// An I/O error occurred on the cache file or its temporary sibling.
    #[error("Cache I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// A line of the cache file is not a valid record.
    ///
    /// There is no fallback to an empty cache; a corrupt cache file is
    /// fatal for the pass.
    #[error("Malformed cache file {path} at line {line}: {source}")]
    Malformed {
        /// Path of the cache file
        path: PathBuf,
        /// 1-based line number of the offending line
        line: usize,
        /// The underlying parse error
        #[source]
        source: serde_json::Error,
    },

    /// The completed temporary file could not replace the cache file.
    #[error("Failed to persist cache file {path}: {source}")]
    Persist {
        /// Target cache path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}
