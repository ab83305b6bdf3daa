//! Extraction quota tracking.

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::QuotaResource;
use crate::Result;

/// Tracks file count and bytes written during one extraction.
#[derive(Debug)]
pub struct QuotaTracker {
    limits: ExtractionConfig,
    files_written: usize,
    bytes_written: u64,
}

impl QuotaTracker {
    /// Creates a tracker enforcing `limits`.
    #[must_use]
    pub const fn new(limits: ExtractionConfig) -> Self {
        Self {
            limits,
            files_written: 0,
            bytes_written: 0,
        }
    }

    /// Reserves room for one more file whose header declares `declared_size`.
    ///
    /// The declared size is only used to fail early; actual bytes are
    /// charged through [`record_bytes`](Self::record_bytes).
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::TooLarge`] if the file count or the
    /// declared total would pass the ceiling.
    pub fn reserve_file(&mut self, declared_size: u64) -> Result<()> {
        let files = self.files_written + 1;
        if files > self.limits.max_file_count {
            return Err(ExtractionError::TooLarge {
                resource: QuotaResource::FileCount {
                    current: files,
                    max: self.limits.max_file_count,
                },
            });
        }

        let projected = self.bytes_written.checked_add(declared_size).ok_or(
            ExtractionError::TooLarge {
                resource: QuotaResource::IntegerOverflow,
            },
        )?;
        if projected > self.limits.max_total_size {
            return Err(ExtractionError::TooLarge {
                resource: QuotaResource::TotalSize {
                    current: projected,
                    max: self.limits.max_total_size,
                },
            });
        }

        self.files_written = files;
        Ok(())
    }

    /// Charges bytes actually written.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::TooLarge`] if the running total passes the
    /// ceiling or overflows.
    pub fn record_bytes(&mut self, bytes: u64) -> Result<()> {
        let total = self
            .bytes_written
            .checked_add(bytes)
            .ok_or(ExtractionError::TooLarge {
                resource: QuotaResource::IntegerOverflow,
            })?;
        if total > self.limits.max_total_size {
            return Err(ExtractionError::TooLarge {
                resource: QuotaResource::TotalSize {
                    current: total,
                    max: self.limits.max_total_size,
                },
            });
        }
        self.bytes_written = total;
        Ok(())
    }

    /// Returns the number of files written.
    #[must_use]
    pub const fn files_written(&self) -> usize {
        self.files_written
    }

    /// Returns the total bytes written.
    #[must_use]
    pub const fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// Returns the byte ceiling.
    #[must_use]
    pub const fn max_total_size(&self) -> u64 {
        self.limits.max_total_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limits(max_total_size: u64, max_file_count: usize) -> ExtractionConfig {
        ExtractionConfig {
            max_total_size,
            max_file_count,
        }
    }

    #[test]
    fn test_quota_tracker_new() {
        let tracker = QuotaTracker::new(ExtractionConfig::default());
        assert_eq!(tracker.files_written(), 0);
        assert_eq!(tracker.bytes_written(), 0);
    }

    #[test]
    fn test_reserve_and_record() {
        let mut tracker = QuotaTracker::new(limits(1000, 10));
        assert!(tracker.reserve_file(600).is_ok());
        assert!(tracker.record_bytes(600).is_ok());
        assert_eq!(tracker.files_written(), 1);
        assert_eq!(tracker.bytes_written(), 600);
    }

    #[test]
    fn test_exceed_file_count() {
        let mut tracker = QuotaTracker::new(limits(1000, 2));
        assert!(tracker.reserve_file(0).is_ok());
        assert!(tracker.reserve_file(0).is_ok());
        let result = tracker.reserve_file(0);
        assert!(matches!(
            result,
            Err(ExtractionError::TooLarge {
                resource: QuotaResource::FileCount { current: 3, max: 2 }
            })
        ));
    }

    #[test]
    fn test_declared_size_fails_early() {
        let mut tracker = QuotaTracker::new(limits(1000, 10));
        assert!(tracker.record_bytes(600).is_ok());
        let result = tracker.reserve_file(500);
        assert!(matches!(result, Err(ExtractionError::TooLarge { .. })));
        assert_eq!(tracker.files_written(), 0);
    }

    #[test]
    fn test_exceed_total_size() {
        let mut tracker = QuotaTracker::new(limits(1000, 10));
        assert!(tracker.record_bytes(1000).is_ok());
        assert!(matches!(
            tracker.record_bytes(1),
            Err(ExtractionError::TooLarge { .. })
        ));
    }

    #[test]
    fn test_overflow() {
        let mut tracker = QuotaTracker::new(limits(u64::MAX, 10));
        assert!(tracker.record_bytes(u64::MAX).is_ok());
        assert!(matches!(
            tracker.record_bytes(1),
            Err(ExtractionError::TooLarge {
                resource: QuotaResource::IntegerOverflow
            })
        ));
    }
}
