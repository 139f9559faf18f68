//! Thumbnail descriptors for directory entries.
//!
//! This module defines the two core data types:
//!
//! * [`Thumbnail`]: an immutable descriptor of one directory entry, built
//!   from live filesystem state (name, type, last-touched timestamp).
//! * [`ThumbRecord`]: the serializable form of a descriptor, as streamed to
//!   the consumer and written to or read from the cache file.
//!
//! # Freshness
//!
//! The `touched` timestamp is the later of an entry's modification and
//! creation/status-change times, captured once at descriptor construction.
//! It is the sole freshness signal: a descriptor is equivalent to a cached
//! record iff `name` and `touched` are exactly equal, in which case the
//! cached preview may be reused without recomputation.

pub mod listing;
pub mod preview;

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Maximum bounding box for generated previews, in pixels.
pub const THUMB_SIZE: u32 = 64;

/// File extensions for which a preview image is generated.
pub const IMAGE_TYPES: [&str; 5] = ["jpg", "jpeg", "bmp", "gif", "png"];

/// Default name of the cache file, stored inside the directory it describes.
pub const DEFAULT_FILENAME: &str = ".thumbs.json";

/// Errors that can occur while building descriptors or previews.
#[derive(thiserror::Error, Debug)]
pub enum ThumbError {
    /// The entry disappeared between enumeration and descriptor construction.
    #[error("Path not found: {0}")]
    NotFound(PathBuf),

    /// An I/O error occurred while reading entry metadata.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The preview image could not be decoded or re-encoded.
    #[error("Failed to render preview for {path}: {source}")]
    Preview {
        /// Path of the source image
        path: PathBuf,
        /// The underlying image error
        #[source]
        source: image::ImageError,
    },
}

/// Immutable descriptor of one directory entry.
///
/// Constructed fresh on every pass; the timestamp is never recomputed for a
/// given instance.
#[derive(Debug, Clone)]
pub struct Thumbnail {
    /// Entry name, unique within one listing pass
    pub name: String,
    /// Absolute path of the entry
    pub path: PathBuf,
    /// `"dir"` for directories, else the lower-cased extension without dot
    pub kind: String,
    /// max(mtime, ctime) in seconds since the epoch
    pub touched: f64,
}

impl Thumbnail {
    /// Build a descriptor for the entry `name` inside `root`.
    ///
    /// Fails with [`ThumbError::NotFound`] if the entry no longer exists;
    /// this is fatal for the pass and not retried.
    pub fn new(root: &Path, name: &str) -> Result<Self, ThumbError> {
        let path = root.join(name);
        let meta = std::fs::metadata(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ThumbError::NotFound(path.clone())
            } else {
                ThumbError::Io {
                    path: path.clone(),
                    source: e,
                }
            }
        })?;

        let kind = if meta.is_dir() {
            "dir".to_string()
        } else {
            path.extension()
                .map(|ext| ext.to_string_lossy().to_lowercase())
                .unwrap_or_default()
        };

        Ok(Self {
            name: name.to_string(),
            touched: touched_secs(&meta),
            path,
            kind,
        })
    }

    /// Whether this entry gets an embedded preview image.
    #[must_use]
    pub fn is_image(&self) -> bool {
        IMAGE_TYPES.contains(&self.kind.as_str())
    }

    /// Compute the preview data-URL for this entry.
    ///
    /// For image types this opens and re-encodes the source file; for all
    /// other types it returns an empty string with no I/O performed.
    pub fn data_url(&self) -> Result<String, ThumbError> {
        if self.is_image() {
            preview::render_data_url(&self.path)
        } else {
            Ok(String::new())
        }
    }

    /// Build the full serializable record, forcing preview computation.
    pub fn into_record(self) -> Result<ThumbRecord, ThumbError> {
        let data_url = self.data_url()?;
        Ok(ThumbRecord {
            name: self.name,
            kind: self.kind,
            touched: self.touched,
            data_url,
        })
    }
}

/// Serializable form of a descriptor, one per cache file line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThumbRecord {
    /// Entry name
    pub name: String,
    /// Entry type (`"dir"`, extension, or empty)
    #[serde(rename = "type", default)]
    pub kind: String,
    /// Freshness timestamp, compared exactly against fresh descriptors
    pub touched: f64,
    /// Preview data-URL, empty for non-image types
    #[serde(default)]
    pub data_url: String,
}

impl ThumbRecord {
    /// The terminator record yielded after a known-cache stream is exhausted.
    ///
    /// An empty name is not a valid entry name, so the sentinel never
    /// matches a real descriptor and the merge cursor never runs off the
    /// end of the known stream.
    #[must_use]
    pub fn sentinel() -> Self {
        Self {
            name: String::new(),
            kind: String::new(),
            touched: 0.0,
            data_url: String::new(),
        }
    }

    /// Whether a fresh descriptor is equivalent to this cached record.
    ///
    /// Equality of `touched` is exact: a reused record must describe the
    /// same on-disk state bit for bit.
    #[must_use]
    pub fn matches(&self, fresh: &Thumbnail) -> bool {
        self.name == fresh.name && self.touched == fresh.touched
    }
}

/// Freshness timestamp for an entry: max(mtime, ctime) in seconds.
fn touched_secs(meta: &Metadata) -> f64 {
    let modified = meta
        .modified()
        .map(system_time_secs)
        .unwrap_or_default();
    modified.max(status_changed_secs(meta))
}

fn system_time_secs(t: SystemTime) -> f64 {
    match t.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs_f64(),
        Err(e) => -e.duration().as_secs_f64(),
    }
}

/// Status-change time on Unix (inode ctime).
#[cfg(unix)]
fn status_changed_secs(meta: &Metadata) -> f64 {
    use std::os::unix::fs::MetadataExt;
    meta.ctime() as f64 + meta.ctime_nsec() as f64 / 1e9
}

/// Creation time elsewhere, where available.
#[cfg(not(unix))]
fn status_changed_secs(meta: &Metadata) -> f64 {
    meta.created().map(system_time_secs).unwrap_or_default()
}
