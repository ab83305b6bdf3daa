//! Per-member admission checks.

use std::fmt;

use crate::types::ArchiveMember;
use crate::types::DestDir;
use crate::types::MemberKind;
use crate::types::PathViolation;
use crate::types::SafePath;

/// Reason an archive member was not extracted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Character/block device, FIFO or other special entry.
    DeviceFile,
    /// Symbolic or hard link.
    Link,
    /// Path does not resolve to a descendant of the destination.
    IllegalPath(PathViolation),
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DeviceFile => f.write_str("device file"),
            Self::Link => f.write_str("symlink or hard link"),
            Self::IllegalPath(_) => f.write_str("illegal path"),
        }
    }
}

/// Decides, member by member, what may be written under a destination.
///
/// Checks run in a fixed order: special entries first, then links, then
/// path containment. The first failing check names the rejection. A
/// rejection never aborts the archive; the caller skips the member and
/// moves on.
#[derive(Debug, Clone, Copy)]
pub struct MemberFilter<'a> {
    dest: &'a DestDir,
}

impl<'a> MemberFilter<'a> {
    /// Creates a filter bound to `dest`.
    #[must_use]
    pub const fn new(dest: &'a DestDir) -> Self {
        Self { dest }
    }

    /// Admits or rejects one member.
    ///
    /// Returns `Ok(None)` for a directory entry that names the destination
    /// itself (`./`), which needs no work. Rejections are logged here.
    ///
    /// # Errors
    ///
    /// Returns the [`Rejection`] when the member must be skipped.
    pub fn check(&self, member: &ArchiveMember) -> Result<Option<SafePath>, Rejection> {
        let verdict = self.evaluate(member);
        if let Err(reason) = &verdict {
            tracing::info!(
                member = %member.path.display(),
                %reason,
                "{} is blocked ({reason})",
                member.path.display()
            );
        }
        verdict
    }

    fn evaluate(&self, member: &ArchiveMember) -> Result<Option<SafePath>, Rejection> {
        if member.kind.is_special() {
            return Err(Rejection::DeviceFile);
        }
        if member.kind.is_link() {
            return Err(Rejection::Link);
        }
        match SafePath::validate(&member.path, self.dest) {
            Ok(safe) => Ok(Some(safe)),
            Err(PathViolation::Empty) if member.kind == MemberKind::Directory => Ok(None),
            Err(violation) => Err(Rejection::IllegalPath(violation)),
        }
    }
}
