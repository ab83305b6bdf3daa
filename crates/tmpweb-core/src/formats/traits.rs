//! Common trait for upload format handlers.

use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::Result;
use crate::types::DestDir;

/// Trait for upload format handlers.
pub trait ArchiveFormat {
    /// Materializes the upload under `dest`, honoring `limits`.
    ///
    /// # Errors
    ///
    /// Returns an error if the container is unreadable or a ceiling is
    /// exceeded. Individual dangerous members are skipped, not errors.
    fn extract(&mut self, dest: &DestDir, limits: &ExtractionConfig) -> Result<ExtractionReport>;

    /// Returns the format name.
    fn format_name(&self) -> &'static str;
}
