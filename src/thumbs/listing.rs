//! Non-recursive directory listing into thumbnail descriptors.
//!
//! Only immediate children are examined. File descriptors are sorted by
//! `touched` descending so that the freshest entries stream first and a
//! cache write preserves that order for the next merge pass; directory
//! descriptors keep filesystem enumeration order. This asymmetry is
//! intentional.

use std::cmp::Ordering;
use std::path::Path;

use super::{ThumbError, Thumbnail};

/// Descending-by-freshness comparator for file descriptors.
fn newest_first(a: &Thumbnail, b: &Thumbnail) -> Ordering {
    b.touched.total_cmp(&a.touched)
}

/// List descriptors for the plain files directly inside `folder`.
///
/// The cache file itself (`cache_name`) is excluded. A missing or
/// non-directory `folder` yields an empty list, not an error; an entry
/// vanishing between enumeration and stat is fatal for the pass.
pub fn list_files(folder: &Path, cache_name: &str) -> Result<Vec<Thumbnail>, ThumbError> {
    let mut files = list_entries(folder, Some(cache_name), false)?;
    files.sort_by(newest_first);
    Ok(files)
}

/// List descriptors for the directories directly inside `folder`.
///
/// Enumeration order is preserved (no sort). A missing or non-directory
/// `folder` yields an empty list.
pub fn list_dirs(folder: &Path) -> Result<Vec<Thumbnail>, ThumbError> {
    list_entries(folder, None, true)
}

fn list_entries(
    folder: &Path,
    skip: Option<&str>,
    want_dirs: bool,
) -> Result<Vec<Thumbnail>, ThumbError> {
    let entries = match std::fs::read_dir(folder) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Cannot list {}: {}", folder.display(), e);
            return Ok(Vec::new());
        }
    };

    let mut thumbs = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ThumbError::Io {
            path: folder.to_path_buf(),
            source: e,
        })?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if skip == Some(name.as_str()) {
            continue;
        }
        // Partition on real file type, symlinks followed; a plain file
        // whose extension happens to be "dir" still lists as a file.
        if entry.path().is_dir() == want_dirs {
            thumbs.push(Thumbnail::new(folder, &name)?);
        }
    }
    Ok(thumbs)
}
