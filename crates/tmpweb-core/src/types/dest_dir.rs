//! Validated destination directory type.

use crate::ExtractionError;
use crate::Result;
use std::path::Path;
use std::path::PathBuf;

/// A validated destination directory for archive extraction.
///
/// The directory exists, is a directory, and is held as an absolute
/// canonical path so every later containment check compares like with like.
///
/// # Examples
///
/// ```no_run
/// use tmpweb_core::types::DestDir;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp/extraction")?;
/// println!("Extracting to: {}", dest.as_path().display());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DestDir(PathBuf);

impl DestDir {
    /// Creates a new `DestDir` after validating the path.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Io`] if the path does not exist, is not a
    /// directory, or cannot be canonicalized.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let canonical = path.canonicalize().map_err(|e| {
            ExtractionError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to canonicalize {}: {e}", path.display()),
            ))
        })?;

        if !canonical.is_dir() {
            return Err(ExtractionError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("path is not a directory: {}", path.display()),
            )));
        }

        Ok(Self(canonical))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    /// Joins a validated member path to this directory.
    #[inline]
    #[must_use]
    pub fn join(&self, safe_path: &super::SafePath) -> PathBuf {
        self.0.join(safe_path.as_path())
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_scratch_dir_is_canonical() {
        let scratch = TempDir::new().unwrap();
        let staging = scratch.path().join("staging");
        fs::create_dir(&staging).unwrap();

        let dest = DestDir::new(staging.join("..").join("staging")).unwrap();
        assert!(dest.as_path().is_absolute());
        assert_eq!(dest.as_path(), staging.canonicalize().unwrap());
    }

    #[test]
    fn test_missing_or_file_rejected() {
        let scratch = TempDir::new().unwrap();
        let upload = scratch.path().join("upload.zip");
        fs::write(&upload, b"PK").unwrap();

        assert!(matches!(
            DestDir::new(scratch.path().join("gone")),
            Err(ExtractionError::Io(_))
        ));
        assert!(matches!(DestDir::new(upload), Err(ExtractionError::Io(_))));
    }

    #[test]
    #[cfg(unix)]
    fn test_linked_scratch_resolves_to_target() {
        let scratch = TempDir::new().unwrap();
        let real = scratch.path().join("real");
        fs::create_dir(&real).unwrap();
        let link = scratch.path().join("tmp-link");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let dest = DestDir::new(link).unwrap();
        assert_eq!(dest.as_path(), real.canonicalize().unwrap());
    }
}
