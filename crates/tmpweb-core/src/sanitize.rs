//! Serve-time path sanitization.

use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::SanitizeError;
use crate::types::safe_path::canonicalize_existing;

/// Resolves a client-supplied logical path under `public_root`.
///
/// The path is interpreted relative to `public_root` even when it starts
/// with `/`. It is normalized lexically, joined onto the root, and the
/// longest existing prefix is canonicalized so that links already on disk
/// are followed before the containment check. Paths that do not exist are
/// still resolved; whether the target exists is the caller's concern.
///
/// Must be called before any filesystem read driven by request input.
///
/// # Errors
///
/// Returns [`SanitizeError::OutOfBounds`] if the path contains a NUL byte,
/// carries a drive prefix, climbs above the root, or resolves outside it
/// through a link. Returns [`SanitizeError::Io`] if the root itself cannot
/// be canonicalized.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tmpweb_core::SanitizeError;
/// use tmpweb_core::resolve_public_path;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let root = Path::new("/srv/tmpweb/sites");
///
/// let page = resolve_public_path("mysite/index.html", root)?;
/// assert!(page.starts_with(root));
///
/// assert!(matches!(
///     resolve_public_path("../../etc/passwd", root),
///     Err(SanitizeError::OutOfBounds)
/// ));
/// # Ok(())
/// # }
/// ```
pub fn resolve_public_path(requested: &str, public_root: &Path) -> Result<PathBuf, SanitizeError> {
    if requested.contains('\0') {
        return Err(SanitizeError::OutOfBounds);
    }

    let mut normalized = PathBuf::new();
    for component in Path::new(requested.trim_start_matches('/')).components() {
        match component {
            Component::Normal(part) => normalized.push(part),
            Component::CurDir | Component::RootDir => {}
            Component::ParentDir => {
                if !normalized.pop() {
                    return Err(SanitizeError::OutOfBounds);
                }
            }
            Component::Prefix(_) => return Err(SanitizeError::OutOfBounds),
        }
    }

    let root = public_root.canonicalize()?;
    let resolved = canonicalize_existing(&root.join(&normalized))
        .map_err(|_| SanitizeError::OutOfBounds)?;

    if !resolved.starts_with(&root) {
        tracing::debug!("request path resolved outside the public root");
        return Err(SanitizeError::OutOfBounds);
    }
    Ok(resolved)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn public_root() -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::create_dir(temp.path().join("mysite")).unwrap();
        fs::write(temp.path().join("mysite/index.html"), b"<p>x</p>").unwrap();
        temp
    }

    #[test]
    fn test_traversal_rejected() {
        let root = public_root();
        assert!(matches!(
            resolve_public_path("../../etc/passwd", root.path()),
            Err(SanitizeError::OutOfBounds)
        ));
        assert!(matches!(
            resolve_public_path("mysite/../../x", root.path()),
            Err(SanitizeError::OutOfBounds)
        ));
    }

    #[test]
    fn test_existing_file_resolves_under_root() {
        let root = public_root();
        let resolved = resolve_public_path("mysite/index.html", root.path()).unwrap();
        let canonical_root = root.path().canonicalize().unwrap();
        assert!(resolved.starts_with(&canonical_root));
        assert!(resolved.is_file());
    }

    #[test]
    fn test_leading_slash_is_relative() {
        let root = public_root();
        let resolved = resolve_public_path("/mysite/index.html", root.path()).unwrap();
        assert!(resolved.is_file());
    }

    #[test]
    fn test_missing_path_still_resolves() {
        let root = public_root();
        let resolved = resolve_public_path("mysite/nope/page.html", root.path()).unwrap();
        assert!(resolved.ends_with("mysite/nope/page.html"));
    }

    #[test]
    fn test_inner_parent_dir_allowed() {
        let root = public_root();
        let resolved = resolve_public_path("mysite/css/../index.html", root.path()).unwrap();
        assert!(resolved.is_file());
    }

    #[test]
    fn test_null_byte_rejected() {
        let root = public_root();
        assert!(matches!(
            resolve_public_path("mysite/index.html\0.png", root.path()),
            Err(SanitizeError::OutOfBounds)
        ));
    }

    #[test]
    #[cfg(unix)]
    fn test_symlink_escape_rejected() {
        use std::os::unix::fs::symlink;

        let outside = TempDir::new().unwrap();
        fs::write(outside.path().join("secret"), b"s").unwrap();
        let root = public_root();
        symlink(outside.path(), root.path().join("mysite/leak")).unwrap();

        assert!(matches!(
            resolve_public_path("mysite/leak/secret", root.path()),
            Err(SanitizeError::OutOfBounds)
        ));
    }

    #[test]
    fn test_missing_root_is_io() {
        assert!(matches!(
            resolve_public_path("a", Path::new("/nonexistent/tmpweb/root")),
            Err(SanitizeError::Io(_))
        ));
    }
}
