//! Tar archive format handler.
//!
//! Entries are read one at a time and their data streamed through the
//! shared materializer. The crate's own `unpack` routines are never used,
//! so nothing this module does can create a link or device node.

use std::io::Read;
use std::path::PathBuf;
use std::time::Instant;

use flate2::read::GzDecoder;

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::types::ArchiveMember;
use crate::types::DestDir;
use crate::types::MemberKind;

use super::common::Materializer;
use super::traits::ArchiveFormat;

/// Gzip member header magic.
const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];

/// Tar archive handler over an in-memory upload.
pub struct TarArchive<'d> {
    data: &'d [u8],
}

impl<'d> TarArchive<'d> {
    /// Creates a handler for `data`, which may be plain or gzip-compressed.
    #[must_use]
    pub const fn new(data: &'d [u8]) -> Self {
        Self { data }
    }

    fn is_gzip(&self) -> bool {
        self.data.starts_with(&GZIP_MAGIC)
    }
}

impl ArchiveFormat for TarArchive<'_> {
    fn extract(&mut self, dest: &DestDir, limits: &ExtractionConfig) -> Result<ExtractionReport> {
        let start = Instant::now();
        let compressed = self.is_gzip();
        let reader: Box<dyn Read + '_> = if compressed {
            Box::new(GzDecoder::new(self.data))
        } else {
            Box::new(self.data)
        };

        let mut archive = tar::Archive::new(reader);
        let entries = archive
            .entries()
            .map_err(|e| unreadable(e, compressed, true))?;

        let mut materializer = Materializer::new(dest, limits);
        let mut first = true;

        for entry in entries {
            let mut entry = entry.map_err(|e| unreadable(e, compressed, first))?;
            first = false;

            let member = describe(&entry)?;
            materializer.materialize(&member, &mut entry)?;
        }

        let mut report = materializer.finish();
        report.duration = start.elapsed();
        Ok(report)
    }

    fn format_name(&self) -> &'static str {
        "tar"
    }
}

/// Maps a tar read failure onto the error taxonomy.
///
/// Failing on the very first header of an uncompressed stream means the
/// bytes were never a tar archive at all.
fn unreadable(err: std::io::Error, compressed: bool, first: bool) -> ExtractionError {
    if first && !compressed {
        tracing::debug!(error = %err, "upload is not a tar archive");
        ExtractionError::UnsupportedFormat
    } else {
        ExtractionError::BadArchive(format!("bad tar file: {err}"))
    }
}

fn describe<R: Read>(entry: &tar::Entry<'_, R>) -> Result<ArchiveMember> {
    let path: PathBuf = entry
        .path()
        .map_err(|e| ExtractionError::BadArchive(format!("bad tar member path: {e}")))?
        .into_owned();

    let entry_type = entry.header().entry_type();
    let kind = if entry_type.is_file() || entry_type.is_contiguous() {
        MemberKind::File
    } else if entry_type.is_dir() {
        MemberKind::Directory
    } else if entry_type.is_symlink() {
        MemberKind::Symlink
    } else if entry_type.is_hard_link() {
        MemberKind::Hardlink
    } else {
        MemberKind::Special
    };

    Ok(ArchiveMember::new(path, kind, entry.size()))
}
