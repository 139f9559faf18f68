//! Lazy reader for a previously persisted cache file.

use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::thumbs::ThumbRecord;

use super::CacheError;

/// Lazy stream of the records persisted by the previous pass.
///
/// Records are yielded in the order they were written, which mirrors the
/// file-listing order at write time. After the real records (or immediately,
/// if the cache file does not exist) the stream yields exactly one
/// [`ThumbRecord::sentinel`] and then ends, so a merge cursor holding the
/// current known record never runs off the end of the stream.
pub struct KnownRecords {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line_no: usize,
    sentinel_sent: bool,
}

impl KnownRecords {
    /// Open the cache file at `path` for lazy reading.
    ///
    /// A missing file is not an error: the stream then consists of the
    /// sentinel alone.
    pub fn open(path: &Path) -> Result<Self, CacheError> {
        let lines = match File::open(path) {
            Ok(file) => Some(BufReader::new(file).lines()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("No cache file at {}", path.display());
                None
            }
            Err(e) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source: e,
                })
            }
        };

        Ok(Self {
            path: path.to_path_buf(),
            lines,
            line_no: 0,
            sentinel_sent: false,
        })
    }

    /// A stream with no backing file: the sentinel alone.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            path: PathBuf::new(),
            lines: None,
            line_no: 0,
            sentinel_sent: false,
        }
    }

    fn parse_line(&self, line: &str) -> Option<Result<ThumbRecord, CacheError>> {
        let body = line.trim_end();
        if body.is_empty() || body == "[" || body == "]" {
            return None;
        }
        // Each record line ends with a comma, except the last, where commit
        // overwrote the comma with the closing bracket.
        let body = body
            .strip_suffix(',')
            .or_else(|| body.strip_suffix(']'))
            .unwrap_or(body);
        Some(
            serde_json::from_str(body).map_err(|e| CacheError::Malformed {
                path: self.path.clone(),
                line: self.line_no,
                source: e,
            }),
        )
    }
}

impl Iterator for KnownRecords {
    type Item = Result<ThumbRecord, CacheError>;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(lines) = self.lines.as_mut() {
            let Some(line) = lines.next() else {
                self.lines = None;
                break;
            };
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(e) => {
                    self.lines = None;
                    return Some(Err(CacheError::Io {
                        path: self.path.clone(),
                        source: e,
                    }));
                }
            };
            if let Some(parsed) = self.parse_line(&line) {
                return Some(parsed);
            }
        }

        if self.sentinel_sent {
            None
        } else {
            self.sentinel_sent = true;
            Some(Ok(ThumbRecord::sentinel()))
        }
    }
}
