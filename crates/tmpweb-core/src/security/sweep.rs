//! Post-extraction sweep of the materialized tree.
//!
//! Extraction never creates links, but the sweep does not rely on that: it
//! walks the finished tree without following links, unlinks anything that
//! is not a regular file or directory, and recomputes the byte total from
//! what is actually on disk.

use std::path::Path;

use walkdir::WalkDir;

use crate::ExtractionError;
use crate::QuotaResource;
use crate::Result;

/// Outcome of a sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    /// Sum of regular file sizes left in the tree.
    pub total_bytes: u64,
    /// Entries removed.
    pub removed: usize,
}

/// Removes links and special entries under `root` and totals file sizes.
///
/// # Errors
///
/// Returns [`ExtractionError::TooLarge`] as soon as the running total
/// exceeds `max_total_size`, or [`ExtractionError::Io`] if the walk or a
/// removal fails.
pub fn sweep_tree(root: &Path, max_total_size: u64) -> Result<SweepOutcome> {
    let mut outcome = SweepOutcome::default();

    for entry in WalkDir::new(root).follow_links(false).min_depth(1) {
        let entry = entry.map_err(|e| {
            ExtractionError::Io(
                e.into_io_error()
                    .unwrap_or_else(|| std::io::Error::other("filesystem loop during sweep")),
            )
        })?;
        let file_type = entry.file_type();

        if file_type.is_dir() {
            continue;
        }

        if file_type.is_file() {
            let len = entry.metadata().map_err(|e| {
                ExtractionError::Io(
                    e.into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("metadata unavailable")),
                )
            })?;
            outcome.total_bytes = outcome.total_bytes.checked_add(len.len()).ok_or(
                ExtractionError::TooLarge {
                    resource: QuotaResource::IntegerOverflow,
                },
            )?;
            if outcome.total_bytes > max_total_size {
                return Err(ExtractionError::TooLarge {
                    resource: QuotaResource::TotalSize {
                        current: outcome.total_bytes,
                        max: max_total_size,
                    },
                });
            }
            continue;
        }

        tracing::warn!(path = %entry.path().display(), "removing non-regular entry after extraction");
        std::fs::remove_file(entry.path())?;
        outcome.removed += 1;
    }

    Ok(outcome)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_sweep_counts_files() {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("css")).unwrap();
        fs::write(temp.path().join("index.html"), b"0123456789").unwrap();
        fs::write(temp.path().join("css/site.css"), b"body{}").unwrap();

        let outcome = sweep_tree(temp.path(), 1000).unwrap();
        assert_eq!(outcome.total_bytes, 16);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn test_sweep_enforces_limit() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("a"), vec![0u8; 600]).unwrap();
        fs::write(temp.path().join("b"), vec![0u8; 600]).unwrap();

        let result = sweep_tree(temp.path(), 1000);
        assert!(matches!(result, Err(ExtractionError::TooLarge { .. })));
    }

    #[test]
    #[cfg(unix)]
    fn test_sweep_removes_symlinks() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("big"), vec![0u8; 4096]).unwrap();

        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("sub")).unwrap();
        fs::write(temp.path().join("index.html"), b"hi").unwrap();
        symlink(outside.path().join("big"), temp.path().join("file-link")).unwrap();
        symlink(outside.path(), temp.path().join("sub/dir-link")).unwrap();

        let outcome = sweep_tree(temp.path(), 100).unwrap();
        assert_eq!(outcome.total_bytes, 2);
        assert_eq!(outcome.removed, 2);
        assert!(fs::symlink_metadata(temp.path().join("file-link")).is_err());
        assert!(fs::symlink_metadata(temp.path().join("sub/dir-link")).is_err());
        assert!(outside.path().join("big").exists());
    }
}
