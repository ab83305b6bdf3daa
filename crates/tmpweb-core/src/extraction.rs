//! Safe extraction of an upload into a destination directory.

use std::path::Path;

use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::Result;
use crate::formats::ArchiveKind;
use crate::formats::handler_for;
use crate::security::sweep_tree;
use crate::types::DestDir;

/// Extracts untrusted uploads under explicit size and count ceilings.
///
/// Extraction is all-or-nothing for the destination's contents: on any
/// error, everything written under `dest` is removed before returning.
/// The destination directory itself is left in place for its owner to
/// dispose of.
///
/// # Examples
///
/// ```no_run
/// use tmpweb_core::ArchiveKind;
/// use tmpweb_core::ExtractionConfig;
/// use tmpweb_core::SafeArchiveExtractor;
/// use tmpweb_core::formats::sniff;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let upload = std::fs::read("site.zip")?;
/// let scratch = tempfile::tempdir()?;
///
/// let extractor = SafeArchiveExtractor::new(&ExtractionConfig::default());
/// let report = extractor.extract(&upload, sniff(&upload), scratch.path())?;
/// println!("{} files, {} bytes", report.files_extracted, report.bytes_written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SafeArchiveExtractor {
    limits: ExtractionConfig,
}

impl SafeArchiveExtractor {
    /// Creates an extractor enforcing `limits`.
    #[must_use]
    pub const fn new(limits: &ExtractionConfig) -> Self {
        Self { limits: *limits }
    }

    /// Extracts `data` as `kind` into `dest`.
    ///
    /// Dangerous members (links, device nodes, escaping paths) are skipped
    /// and logged. After the members are written, the tree is swept for
    /// any non-regular entry and its on-disk size is recomputed.
    ///
    /// # Errors
    ///
    /// - [`ExtractionError::UnsupportedFormat`](crate::ExtractionError::UnsupportedFormat)
    ///   if the bytes are not a container of the given kind
    /// - [`ExtractionError::BadArchive`](crate::ExtractionError::BadArchive)
    ///   if the container is corrupt
    /// - [`ExtractionError::TooLarge`](crate::ExtractionError::TooLarge) if
    ///   a ceiling is exceeded
    /// - [`ExtractionError::Io`](crate::ExtractionError::Io) on filesystem
    ///   failure
    pub fn extract(&self, data: &[u8], kind: ArchiveKind, dest: &Path) -> Result<ExtractionReport> {
        let dest = DestDir::new(dest)?;
        let result = self.extract_into(data, kind, &dest);
        if let Err(err) = &result {
            tracing::debug!(
                error = %err,
                dest = %dest.as_path().display(),
                "extraction failed, rolling back"
            );
            if let Err(cleanup) = clear_directory(dest.as_path()) {
                tracing::error!(
                    error = %cleanup,
                    dest = %dest.as_path().display(),
                    "failed to roll back partial extraction"
                );
            }
        }
        result
    }

    fn extract_into(
        &self,
        data: &[u8],
        kind: ArchiveKind,
        dest: &DestDir,
    ) -> Result<ExtractionReport> {
        let mut handler = handler_for(kind, data);
        let mut report = handler.extract(dest, &self.limits)?;

        let swept = sweep_tree(dest.as_path(), self.limits.max_total_size)?;
        report.bytes_written = swept.total_bytes;
        report.entries_swept = swept.removed;

        tracing::info!(
            format = handler.format_name(),
            files = report.files_extracted,
            bytes = report.bytes_written,
            blocked = report.members_blocked,
            "upload extracted"
        );
        Ok(report)
    }
}

/// Removes every entry under `dir` without removing `dir` itself.
fn clear_directory(dir: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            std::fs::remove_dir_all(entry.path())?;
        } else {
            std::fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
