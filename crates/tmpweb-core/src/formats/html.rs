//! Single-page uploads.

use std::time::Instant;

use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::Result;
use crate::types::ArchiveMember;
use crate::types::DestDir;
use crate::types::MemberKind;

use super::common::Materializer;
use super::traits::ArchiveFormat;

/// File name a raw HTML upload is stored under.
pub const INDEX_FILE: &str = "index.html";

/// A raw HTML upload, materialized as a one-file site.
pub struct HtmlPage<'d> {
    data: &'d [u8],
}

impl<'d> HtmlPage<'d> {
    /// Wraps the page bytes.
    #[must_use]
    pub const fn new(data: &'d [u8]) -> Self {
        Self { data }
    }
}

impl ArchiveFormat for HtmlPage<'_> {
    fn extract(&mut self, dest: &DestDir, limits: &ExtractionConfig) -> Result<ExtractionReport> {
        let start = Instant::now();
        let mut materializer = Materializer::new(dest, limits);
        let member = ArchiveMember::new(INDEX_FILE, MemberKind::File, self.data.len() as u64);
        let mut reader = self.data;
        materializer.materialize(&member, &mut reader)?;

        let mut report = materializer.finish();
        report.duration = start.elapsed();
        Ok(report)
    }

    fn format_name(&self) -> &'static str {
        "html"
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::ExtractionError;
    use tempfile::TempDir;

    #[test]
    fn test_page_written_as_index() {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();
        let page = b"<!DOCTYPE html><title>t</title>";

        let report = HtmlPage::new(page)
            .extract(&dest, &ExtractionConfig::default())
            .unwrap();

        assert_eq!(report.files_extracted, 1);
        assert_eq!(std::fs::read(temp.path().join(INDEX_FILE)).unwrap(), page);
    }

    #[test]
    fn test_page_counts_against_ceiling() {
        let temp = TempDir::new().unwrap();
        let dest = DestDir::new(temp.path()).unwrap();
        let limits = ExtractionConfig {
            max_total_size: 4,
            max_file_count: 1,
        };

        let result = HtmlPage::new(b"<!doctype html>").extract(&dest, &limits);
        assert!(matches!(result, Err(ExtractionError::TooLarge { .. })));
    }
}
