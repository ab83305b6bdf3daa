//! ZIP archive format handler.

use std::io::Cursor;
use std::path::PathBuf;
use std::time::Instant;

use zip::ZipArchive as ZipReader;
use zip::result::ZipError;

use crate::ExtractionConfig;
use crate::ExtractionError;
use crate::ExtractionReport;
use crate::Result;
use crate::types::ArchiveMember;
use crate::types::DestDir;
use crate::types::MemberKind;

use super::common::Materializer;
use super::traits::ArchiveFormat;

const S_IFMT: u32 = 0o170_000;
const S_IFSOCK: u32 = 0o140_000;
const S_IFLNK: u32 = 0o120_000;
const S_IFBLK: u32 = 0o060_000;
const S_IFDIR: u32 = 0o040_000;
const S_IFCHR: u32 = 0o020_000;
const S_IFIFO: u32 = 0o010_000;

/// ZIP archive handler over an in-memory upload.
pub struct ZipArchive<'d> {
    data: &'d [u8],
}

impl<'d> ZipArchive<'d> {
    /// Creates a handler for `data`.
    #[must_use]
    pub const fn new(data: &'d [u8]) -> Self {
        Self { data }
    }
}

impl ArchiveFormat for ZipArchive<'_> {
    fn extract(&mut self, dest: &DestDir, limits: &ExtractionConfig) -> Result<ExtractionReport> {
        let start = Instant::now();
        let mut archive = ZipReader::new(Cursor::new(self.data)).map_err(bad_zip)?;
        let mut materializer = Materializer::new(dest, limits);

        for index in 0..archive.len() {
            let mut file = archive.by_index(index).map_err(bad_zip)?;
            let member = ArchiveMember::new(
                PathBuf::from(file.name()),
                classify(file.unix_mode(), file.is_dir()),
                file.size(),
            );
            materializer.materialize(&member, &mut file)?;
        }

        let mut report = materializer.finish();
        report.duration = start.elapsed();
        Ok(report)
    }

    fn format_name(&self) -> &'static str {
        "zip"
    }
}

fn bad_zip(err: ZipError) -> ExtractionError {
    ExtractionError::BadArchive(format!("bad zip file: {err}"))
}

/// Derives the member kind from the unix mode stored in the external
/// attributes, falling back to the trailing-slash convention.
fn classify(unix_mode: Option<u32>, name_is_dir: bool) -> MemberKind {
    match unix_mode.map(|mode| mode & S_IFMT) {
        Some(S_IFLNK) => MemberKind::Symlink,
        Some(S_IFCHR | S_IFBLK | S_IFIFO | S_IFSOCK) => MemberKind::Special,
        Some(S_IFDIR) => MemberKind::Directory,
        _ if name_is_dir => MemberKind::Directory,
        _ => MemberKind::File,
    }
}
