//! Locating the servable root inside an extracted tree.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::ResolveError;

/// Finds the directory that holds the site content.
///
/// Archivers often wrap everything in one top-level folder. Starting at
/// `extracted`, this descends through directories that contain exactly one
/// subdirectory and nothing else, and stops at the first directory holding
/// at least one file or at least two subdirectories.
///
/// Symbolic links are neither followed nor counted.
///
/// # Errors
///
/// Returns [`ResolveError::NoServableContent`] if the descent bottoms out
/// in an empty directory, or [`ResolveError::Io`] if a directory cannot be
/// read.
///
/// # Examples
///
/// ```no_run
/// use tmpweb_core::resolve_web_root;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // extracted/mysite-v1/{index.html, css/}
/// let root = resolve_web_root("extracted".as_ref())?;
/// assert!(root.ends_with("mysite-v1"));
/// # Ok(())
/// # }
/// ```
pub fn resolve_web_root(extracted: &Path) -> Result<PathBuf, ResolveError> {
    let mut current = extracted.to_path_buf();

    loop {
        let mut subdirs = Vec::new();
        let mut files = 0usize;

        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_dir() {
                subdirs.push(entry.path());
            } else if file_type.is_file() {
                files += 1;
            }
        }

        if files > 0 || subdirs.len() >= 2 {
            return Ok(current);
        }

        match subdirs.pop() {
            Some(only) => current = only,
            None => return Err(ResolveError::NoServableContent),
        }
    }
}
