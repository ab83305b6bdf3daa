//! Validated member path type.

use std::fmt;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use super::DestDir;

/// Why a member path was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathViolation {
    /// Path contains a NUL byte.
    NullByte,
    /// Path is absolute or carries a drive prefix.
    Absolute,
    /// Path climbs above the destination, lexically or through an existing
    /// link on disk.
    Escapes,
    /// Path normalizes to the destination itself.
    Empty,
    /// An existing ancestor could not be resolved.
    Unresolvable,
}

impl fmt::Display for PathViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NullByte => "contains a null byte",
            Self::Absolute => "is absolute",
            Self::Escapes => "escapes the destination",
            Self::Empty => "is empty",
            Self::Unresolvable => "cannot be resolved",
        };
        f.write_str(reason)
    }
}

/// A member path proven to resolve inside a [`DestDir`].
///
/// Only constructible through [`SafePath::validate`]. The inner path is
/// relative and fully normalized: no `.`, no `..`, no root.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tmpweb_core::types::DestDir;
/// use tmpweb_core::types::SafePath;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = DestDir::new("/tmp")?;
///
/// let safe = SafePath::validate(Path::new("site/./index.html"), &dest).unwrap();
/// assert_eq!(safe.as_path(), Path::new("site/index.html"));
///
/// assert!(SafePath::validate(Path::new("../etc/passwd"), &dest).is_err());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SafePath(PathBuf);

impl SafePath {
    /// Validates a member path against a destination directory.
    ///
    /// `..` components are resolved lexically; a path that stays inside the
    /// destination after resolution (`a/../b`) is accepted as `b`. The
    /// nearest existing ancestor of the joined path is then canonicalized
    /// and must still lie under `dest`, which catches escapes through links
    /// already on disk.
    ///
    /// # Errors
    ///
    /// Returns the [`PathViolation`] that caused rejection.
    pub fn validate(path: &Path, dest: &DestDir) -> Result<Self, PathViolation> {
        if has_null_bytes(path) {
            return Err(PathViolation::NullByte);
        }

        let mut normalized = PathBuf::new();
        for component in path.components() {
            match component {
                Component::Normal(part) => normalized.push(part),
                Component::CurDir => {}
                Component::ParentDir => {
                    if !normalized.pop() {
                        return Err(PathViolation::Escapes);
                    }
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(PathViolation::Absolute);
                }
            }
        }

        if normalized.as_os_str().is_empty() {
            return Err(PathViolation::Empty);
        }

        let resolved = dest.as_path().join(&normalized);
        let existing =
            canonicalize_existing(&resolved).map_err(|_| PathViolation::Unresolvable)?;
        if !existing.starts_with(dest.as_path()) {
            return Err(PathViolation::Escapes);
        }

        Ok(Self(normalized))
    }

    /// Returns the path as a `&Path`.
    #[inline]
    #[must_use]
    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

/// Canonicalizes the longest existing prefix of `path` and re-appends the
/// components that do not exist yet.
///
/// The result is absolute and every link in the existing prefix has been
/// resolved. Components past the first missing one are appended verbatim.
pub(crate) fn canonicalize_existing(path: &Path) -> std::io::Result<PathBuf> {
    let mut missing = Vec::new();
    let mut cursor = path;
    loop {
        match cursor.canonicalize() {
            Ok(mut canonical) => {
                for part in missing.iter().rev() {
                    canonical.push(part);
                }
                return Ok(canonical);
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let Some(name) = cursor.file_name() else {
                    return Err(e);
                };
                missing.push(name.to_os_string());
                cursor = match cursor.parent() {
                    Some(parent) if !parent.as_os_str().is_empty() => parent,
                    _ => return Err(e),
                };
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(unix)]
fn has_null_bytes(path: &Path) -> bool {
    use std::os::unix::ffi::OsStrExt;
    path.as_os_str().as_bytes().contains(&b'\0')
}

#[cfg(not(unix))]
fn has_null_bytes(path: &Path) -> bool {
    path.to_str().is_none_or(|s| s.contains('\0'))
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn create_test_dest() -> (TempDir, DestDir) {
        let temp = TempDir::new().expect("failed to create temp dir");
        let dest = DestDir::new(temp.path()).expect("failed to create dest");
        (temp, dest)
    }

    #[test]
    fn test_valid_relative() {
        let (_temp, dest) = create_test_dest();
        let safe = SafePath::validate(Path::new("foo/bar/baz.txt"), &dest).unwrap();
        assert_eq!(safe.as_path(), Path::new("foo/bar/baz.txt"));
        assert!(dest.join(&safe).starts_with(dest.as_path()));
    }

    #[test]
    fn test_empty_path() {
        let (_temp, dest) = create_test_dest();
        assert_eq!(
            SafePath::validate(Path::new(""), &dest),
            Err(PathViolation::Empty)
        );
        assert_eq!(
            SafePath::validate(Path::new("./"), &dest),
            Err(PathViolation::Empty)
        );
    }

    #[test]
    fn test_reject_parent_traversal() {
        let (_temp, dest) = create_test_dest();
        for path in ["../etc/passwd", "foo/../../etc/passwd", "a/b/../../../x"] {
            assert_eq!(
                SafePath::validate(Path::new(path), &dest),
                Err(PathViolation::Escapes),
                "{path} should be rejected"
            );
        }
    }

    #[test]
    fn test_contained_parent_reference_is_normalized() {
        let (_temp, dest) = create_test_dest();
        let safe = SafePath::validate(Path::new("a/../b/./c.txt"), &dest).unwrap();
        assert_eq!(safe.as_path(), Path::new("b/c.txt"));
    }

    #[test]
    fn test_reject_absolute() {
        let (_temp, dest) = create_test_dest();
        assert_eq!(
            SafePath::validate(Path::new("/etc/passwd"), &dest),
            Err(PathViolation::Absolute)
        );
    }

    #[test]
    fn test_null_bytes() {
        let (_temp, dest) = create_test_dest();
        assert_eq!(
            SafePath::validate(Path::new("foo\0bar"), &dest),
            Err(PathViolation::NullByte)
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_reject_escape_through_existing_symlink() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        let (temp, dest) = create_test_dest();
        symlink(outside.path(), temp.path().join("evil")).unwrap();

        assert_eq!(
            SafePath::validate(Path::new("evil/payload.txt"), &dest),
            Err(PathViolation::Escapes)
        );
    }

    #[test]
    fn test_canonicalize_existing_keeps_missing_tail() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing/deeper/file.txt");
        let resolved = canonicalize_existing(&path).unwrap();
        assert_eq!(
            resolved,
            temp.path()
                .canonicalize()
                .unwrap()
                .join("missing/deeper/file.txt")
        );
    }
}
