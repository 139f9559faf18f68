//! Lazy thumbnail streams and the incremental merge engine.
//!
//! # Merge algorithm
//!
//! [`file_thumbs`] walks the freshly listed descriptors and the previously
//! persisted cache records in lockstep, one cursor into each stream:
//!
//! 1. The known cursor is primed from the cache reader before the output
//!    sink opens its temporary file.
//! 2. For each fresh descriptor in order: if the current known record
//!    matches on name and touched-timestamp, the known record is emitted
//!    unchanged (reusing its preview) and the known cursor advances.
//!    Otherwise the full record is built, forcing preview computation, the
//!    pass is marked dirty, and the known cursor stays put - it only
//!    advances on a confirmed match, so one inserted or removed entry does
//!    not desynchronize later matches. Insertions and reordering can still
//!    cascade into recomputation; the match policy is positional-content
//!    equality, not a diff.
//! 3. Every emitted record is appended to the sink as one JSON line before
//!    it is yielded.
//!
//! Because file listings sort by touched-timestamp descending and a cache
//! write preserves that order, the common case of an unchanged directory
//! reuses every record in a single O(n) pass.
//!
//! # Cancellation
//!
//! The streams are pull-based: each record is produced on demand, so
//! expensive preview work is only paid for records actually consumed.
//! Dropping a stream before exhaustion is the cancellation path, not an
//! error: the pending temporary file is discarded and the previous cache
//! file remains exactly as it was.

use std::path::Path;

use crate::cache::{CacheError, CacheSink, KnownRecords};
use crate::thumbs::listing::{list_dirs, list_files};
use crate::thumbs::{ThumbError, ThumbRecord, Thumbnail};

/// Errors surfaced by a thumbnail stream.
#[derive(thiserror::Error, Debug)]
pub enum StreamError {
    /// Descriptor or preview failure.
    #[error(transparent)]
    Thumb(#[from] ThumbError),

    /// Cache read or write failure.
    #[error(transparent)]
    Cache(#[from] CacheError),

    /// Record serialization failure.
    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Stream file-entry records for `folder`, merged against the cache.
///
/// With `preserve` set, the emitted records are additionally persisted to
/// `folder/cache_name` via the transactional [`CacheSink`]; otherwise a
/// null sink swallows the side channel. A missing or non-directory
/// `folder` yields an empty stream with no side effects.
pub fn file_thumbs(
    folder: &Path,
    cache_name: &str,
    preserve: bool,
) -> Result<FileThumbs, StreamError> {
    if !folder.is_dir() {
        return Ok(FileThumbs::empty());
    }

    let fresh = list_files(folder, cache_name)?;
    let mut known = KnownRecords::open(&folder.join(cache_name))?;

    // Prime the known cursor before the sink opens its temp file, so a
    // corrupt first record never leaves a stray file behind.
    let current_known = match known.next() {
        Some(record) => record?,
        None => ThumbRecord::sentinel(),
    };

    let sink = if preserve {
        CacheSink::file(folder, cache_name)?
    } else {
        CacheSink::null()
    };

    Ok(FileThumbs {
        fresh: fresh.into_iter(),
        known,
        current_known,
        sink: Some(sink),
        dirty: false,
        done: false,
    })
}

/// Stream directory-entry records for `folder`.
///
/// Directory previews are always empty and never cached, so this variant
/// skips the merge entirely.
pub fn dir_thumbs(folder: &Path) -> Result<DirThumbs, StreamError> {
    Ok(DirThumbs {
        inner: list_dirs(folder)?.into_iter(),
    })
}

/// Lazy merged stream of file-entry records for one pass.
pub struct FileThumbs {
    fresh: std::vec::IntoIter<Thumbnail>,
    known: KnownRecords,
    current_known: ThumbRecord,
    sink: Option<CacheSink>,
    dirty: bool,
    done: bool,
}

impl FileThumbs {
    fn empty() -> Self {
        Self {
            fresh: Vec::new().into_iter(),
            known: KnownRecords::empty(),
            current_known: ThumbRecord::sentinel(),
            sink: None,
            dirty: false,
            done: true,
        }
    }

    /// Abort the pass: drop the pending temp file, keep the old cache.
    fn fail(&mut self, err: StreamError) -> Option<Result<ThumbRecord, StreamError>> {
        self.done = true;
        self.sink.take();
        Some(Err(err))
    }
}

impl Iterator for FileThumbs {
    type Item = Result<ThumbRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let Some(fresh) = self.fresh.next() else {
            // Normal completion: commit if anything changed, else discard.
            self.done = true;
            if let Some(sink) = self.sink.take() {
                if let Err(e) = sink.finish(self.dirty) {
                    return Some(Err(e.into()));
                }
            }
            return None;
        };

        let record = if self.current_known.matches(&fresh) {
            log::trace!("Reusing cached record for {}", fresh.name);
            let next_known = match self.known.next() {
                Some(Ok(record)) => record,
                Some(Err(e)) => return self.fail(e.into()),
                None => ThumbRecord::sentinel(),
            };
            std::mem::replace(&mut self.current_known, next_known)
        } else {
            log::debug!("Rebuilding record for {}", fresh.name);
            self.dirty = true;
            match fresh.into_record() {
                Ok(record) => record,
                Err(e) => return self.fail(e.into()),
            }
        };

        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => return self.fail(e.into()),
        };
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.write_record(&json) {
                return self.fail(e.into());
            }
        }

        Some(Ok(record))
    }
}

impl Drop for FileThumbs {
    fn drop(&mut self) {
        if !self.done && self.sink.as_ref().is_some_and(CacheSink::is_persistent) {
            // Consumer stopped pulling mid-pass. The new file can't be
            // complete, so the temp file is discarded on drop and the
            // previous cache file stays untouched.
            log::debug!("Thumbnail pass cancelled early, discarding partial cache");
        }
    }
}

/// Lazy stream of directory-entry records.
pub struct DirThumbs {
    inner: std::vec::IntoIter<Thumbnail>,
}

impl Iterator for DirThumbs {
    type Item = Result<ThumbRecord, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        let thumb = self.inner.next()?;
        Some(thumb.into_record().map_err(StreamError::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::thumbs::DEFAULT_FILENAME;
    use std::fs;
    use tempfile::tempdir;

    fn collect(stream: FileThumbs) -> Vec<ThumbRecord> {
        stream.map(|r| r.unwrap()).collect()
    }

    /// Rewrite the cache file with every data_url replaced by a marker, so
    /// reuse (as opposed to recomputation) is observable in the output.
    fn plant_markers(cache: &Path) {
        let content = fs::read_to_string(cache).unwrap();
        let records: Vec<ThumbRecord> = serde_json::from_str(&content).unwrap();
        let lines: Vec<String> = records
            .into_iter()
            .map(|mut r| {
                r.data_url = format!("marker:{}", r.name);
                serde_json::to_string(&r).unwrap()
            })
            .collect();
        fs::write(cache, format!("[\n{}]\n", lines.join(",\n"))).unwrap();
    }

    #[test]
    fn test_missing_folder_yields_empty_stream() {
        let dir = tempdir().unwrap();
        let stream = file_thumbs(&dir.path().join("nope"), DEFAULT_FILENAME, true).unwrap();
        assert!(collect(stream).is_empty());
        // No temp or cache file was created anywhere.
        assert!(fs::read_dir(dir.path()).unwrap().next().is_none());
    }

    #[test]
    fn test_first_pass_is_dirty_and_writes_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();

        let records = collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        assert_eq!(records.len(), 2);
        assert!(dir.path().join(DEFAULT_FILENAME).is_file());
    }

    #[test]
    fn test_unchanged_pass_reuses_every_record() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());

        let cache = dir.path().join(DEFAULT_FILENAME);
        plant_markers(&cache);

        let records = collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        assert_eq!(records.len(), 2);
        for record in &records {
            assert_eq!(record.data_url, format!("marker:{}", record.name));
        }
        // Clean pass: the marked cache was not replaced.
        let survived: Vec<ThumbRecord> =
            serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert!(survived.iter().all(|r| r.data_url.starts_with("marker:")));
    }

    #[test]
    fn test_new_entry_marks_pass_dirty_but_reuses_rest() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        let cache = dir.path().join(DEFAULT_FILENAME);
        plant_markers(&cache);

        fs::write(dir.path().join("z.txt"), b"z").unwrap();

        let records = collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        assert_eq!(records.len(), 2);
        let a = records.iter().find(|r| r.name == "a.txt").unwrap();
        let z = records.iter().find(|r| r.name == "z.txt").unwrap();
        assert_eq!(a.data_url, "marker:a.txt");
        assert_eq!(z.data_url, "");

        // Dirty pass: the cache was replaced with the merged output.
        let rewritten: Vec<ThumbRecord> =
            serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(rewritten.len(), 2);
        assert!(rewritten.iter().any(|r| r.name == "z.txt"));
    }

    #[test]
    fn test_touched_older_entry_rebuilds_exactly_one() {
        use std::time::{Duration, SystemTime};

        let dir = tempdir().unwrap();
        let old = dir.path().join("old.txt");
        let new = dir.path().join("new.txt");
        fs::write(&old, b"old").unwrap();
        fs::write(&new, b"new").unwrap();
        let base = SystemTime::now() + Duration::from_secs(100);
        filetime::set_file_mtime(&old, filetime::FileTime::from_system_time(base)).unwrap();
        filetime::set_file_mtime(
            &new,
            filetime::FileTime::from_system_time(base + Duration::from_secs(100)),
        )
        .unwrap();

        collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        let cache = dir.path().join(DEFAULT_FILENAME);
        plant_markers(&cache);

        // Touch the older entry: it jumps to the front of the listing and
        // the remaining entries stay aligned with the cache.
        filetime::set_file_mtime(
            &old,
            filetime::FileTime::from_system_time(base + Duration::from_secs(200)),
        )
        .unwrap();

        let records = collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name, "old.txt");
        assert_eq!(records[0].data_url, "", "touched entry must be rebuilt");
        assert_eq!(records[1].name, "new.txt");
        assert_eq!(records[1].data_url, "marker:new.txt", "aligned entry must be reused");

        // The reused record carries its cached preview into the new cache.
        let rewritten: Vec<ThumbRecord> =
            serde_json::from_str(&fs::read_to_string(&cache).unwrap()).unwrap();
        assert_eq!(rewritten[1].data_url, "marker:new.txt");
    }

    #[test]
    fn test_no_preserve_leaves_no_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let records = collect(file_thumbs(dir.path(), DEFAULT_FILENAME, false).unwrap());
        assert_eq!(records.len(), 1);
        assert!(!dir.path().join(DEFAULT_FILENAME).exists());
    }

    #[test]
    fn test_cancelled_pass_keeps_previous_cache() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());

        let cache = dir.path().join(DEFAULT_FILENAME);
        let before = fs::read_to_string(&cache).unwrap();

        // Add a fresh entry, then abandon the stream after one record.
        fs::write(dir.path().join("c.txt"), b"c").unwrap();
        {
            let mut stream = file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap();
            stream.next().unwrap().unwrap();
            // Dropped here with two fresh entries still pending.
        }

        assert_eq!(fs::read_to_string(&cache).unwrap(), before);
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(DEFAULT_FILENAME))
            .collect();
        assert_eq!(names, vec![DEFAULT_FILENAME.to_string()]);
    }

    #[test]
    fn test_malformed_cache_mid_stream_is_fatal_without_residue() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();
        fs::write(dir.path().join("b.txt"), b"b").unwrap();
        collect(file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap());

        // Corrupt the second record line, keep the first intact.
        let cache = dir.path().join(DEFAULT_FILENAME);
        let content = fs::read_to_string(&cache).unwrap();
        let mut lines: Vec<&str> = content.lines().collect();
        lines[2] = "{broken,";
        fs::write(&cache, lines.join("\n")).unwrap();

        let mut stream = file_thumbs(dir.path(), DEFAULT_FILENAME, true).unwrap();
        // First fresh entry matches the intact first record; advancing the
        // known cursor then hits the corrupt line.
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(err, StreamError::Cache(CacheError::Malformed { .. })));
        assert!(stream.next().is_none());
        drop(stream);

        let residue = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|n| n.starts_with(DEFAULT_FILENAME))
            .count();
        assert_eq!(residue, 1);
    }

    #[test]
    fn test_dir_thumbs_have_dir_kind_and_no_preview() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(dir.path().join("a.txt"), b"a").unwrap();

        let records: Vec<ThumbRecord> = dir_thumbs(dir.path())
            .unwrap()
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "sub");
        assert_eq!(records[0].kind, "dir");
        assert_eq!(records[0].data_url, "");
    }
}
