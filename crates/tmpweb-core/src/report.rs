//! Extraction operation reporting.

use std::time::Duration;

/// Report of an archive extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractionReport {
    /// Number of regular files written.
    pub files_extracted: usize,

    /// Number of directories created.
    pub directories_created: usize,

    /// Total bytes of regular files left on disk after the sweep.
    pub bytes_written: u64,

    /// Members skipped by the member filter.
    pub members_blocked: usize,

    /// Non-regular entries removed by the post-extraction sweep.
    pub entries_swept: usize,

    /// Duration of the extraction.
    pub duration: Duration,
}

impl ExtractionReport {
    /// Creates a new empty extraction report.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns total number of items materialized.
    #[must_use]
    pub fn total_items(&self) -> usize {
        self.files_extracted + self.directories_created
    }

    /// Returns whether anything in the archive was refused or removed.
    #[must_use]
    pub fn had_rejections(&self) -> bool {
        self.members_blocked > 0 || self.entries_swept > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_report() {
        let report = ExtractionReport::new();
        assert_eq!(report.files_extracted, 0);
        assert_eq!(report.bytes_written, 0);
        assert!(!report.had_rejections());
    }

    #[test]
    fn test_total_items() {
        let report = ExtractionReport {
            files_extracted: 10,
            directories_created: 5,
            ..ExtractionReport::default()
        };
        assert_eq!(report.total_items(), 15);
    }

    #[test]
    fn test_rejections() {
        let report = ExtractionReport {
            members_blocked: 1,
            ..ExtractionReport::default()
        };
        assert!(report.had_rejections());
    }
}
