//! Member materialization shared by every format handler.
//!
//! Format handlers only translate their native entries into
//! [`ArchiveMember`]s and hand over a reader for the member data. Filtering,
//! quota accounting and the actual writes happen here, once.

use std::fs::File;
use std::fs::create_dir_all;
use std::io;
use std::io::BufWriter;
use std::io::Read;
use std::io::Write;

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::copy::CopyBuffer;
use crate::copy::copy_with_limit;
use crate::security::MemberFilter;
use crate::security::QuotaTracker;
use crate::types::ArchiveMember;
use crate::types::DestDir;
use crate::types::MemberKind;
use crate::types::SafePath;

/// Writes admitted members under one destination.
#[derive(Debug)]
pub struct Materializer<'a> {
    dest: &'a DestDir,
    filter: MemberFilter<'a>,
    quota: QuotaTracker,
    buffer: CopyBuffer,
    report: ExtractionReport,
}

impl<'a> Materializer<'a> {
    /// Creates a materializer for `dest` enforcing `limits`.
    #[must_use]
    pub fn new(dest: &'a DestDir, limits: &ExtractionConfig) -> Self {
        Self {
            dest,
            filter: MemberFilter::new(dest),
            quota: QuotaTracker::new(*limits),
            buffer: CopyBuffer::new(),
            report: ExtractionReport::new(),
        }
    }

    /// Filters one member and, if admitted, writes it.
    ///
    /// `data` is only read for regular files. Rejected members are counted
    /// in the report and skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if a ceiling is exceeded, the member data is
    /// corrupt, or the filesystem write fails.
    pub fn materialize<R: Read>(&mut self, member: &ArchiveMember, data: &mut R) -> Result<()> {
        let safe = match self.filter.check(member) {
            Ok(Some(safe)) => safe,
            Ok(None) => return Ok(()),
            Err(_) => {
                self.report.members_blocked += 1;
                return Ok(());
            }
        };

        match member.kind {
            MemberKind::Directory => self.create_directory(&safe),
            MemberKind::File => self.write_file(&safe, member.size, data),
            // The filter never admits links or special entries.
            MemberKind::Symlink | MemberKind::Hardlink | MemberKind::Special => Ok(()),
        }
    }

    /// Consumes the materializer and returns its report.
    #[must_use]
    pub fn finish(mut self) -> ExtractionReport {
        self.report.files_extracted = self.quota.files_written();
        self.report.bytes_written = self.quota.bytes_written();
        self.report
    }

    fn create_directory(&mut self, safe: &SafePath) -> Result<()> {
        create_dir_all(self.dest.join(safe)).map_err(|e| placement_error(e, safe))?;
        self.report.directories_created += 1;
        Ok(())
    }

    fn write_file<R: Read>(&mut self, safe: &SafePath, declared: u64, data: &mut R) -> Result<()> {
        self.quota.reserve_file(declared)?;

        let output_path = self.dest.join(safe);
        if let Some(parent) = output_path.parent() {
            create_dir_all(parent).map_err(|e| placement_error(e, safe))?;
        }

        let file = File::create(&output_path).map_err(|e| placement_error(e, safe))?;
        let mut writer = BufWriter::new(file);
        let written = copy_with_limit(
            data,
            &mut writer,
            &mut self.buffer,
            self.quota.bytes_written(),
            self.quota.max_total_size(),
        )?;
        writer.flush()?;

        self.quota.record_bytes(written)
    }
}

/// A member that collides with an earlier one (file `a`, then `a/b`) is a
/// malformed archive; anything else stays an I/O failure.
fn placement_error(err: io::Error, safe: &SafePath) -> ExtractionError {
    match err.kind() {
        io::ErrorKind::AlreadyExists
        | io::ErrorKind::NotADirectory
        | io::ErrorKind::IsADirectory => ExtractionError::BadArchive(format!(
            "member {} conflicts with an earlier member",
            safe.as_path().display()
        )),
        _ => ExtractionError::Io(err),
    }
}
