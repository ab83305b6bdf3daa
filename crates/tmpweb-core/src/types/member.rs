//! Format-agnostic view of one archive entry.

use std::path::PathBuf;

/// Type tag of an archive member.
///
/// Zip and tar entries are both reduced to this tag so the member filter
/// runs the same checks regardless of container format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    /// Regular file.
    File,
    /// Directory.
    Directory,
    /// Symbolic link.
    Symlink,
    /// Hard link.
    Hardlink,
    /// Character or block device, FIFO, socket, or any other type this
    /// crate does not materialize.
    Special,
}

impl MemberKind {
    /// Returns `true` for symbolic and hard links.
    #[must_use]
    pub const fn is_link(self) -> bool {
        matches!(self, Self::Symlink | Self::Hardlink)
    }

    /// Returns `true` for device nodes and other special entries.
    #[must_use]
    pub const fn is_special(self) -> bool {
        matches!(self, Self::Special)
    }
}

/// One entry of an uploaded archive, before filtering.
///
/// `path` is exactly what the archive declares and must be treated as
/// hostile. `size` is the declared uncompressed size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveMember {
    /// Declared member path.
    pub path: PathBuf,
    /// Member type.
    pub kind: MemberKind,
    /// Declared uncompressed size in bytes.
    pub size: u64,
}

impl ArchiveMember {
    /// Creates a member descriptor.
    pub fn new(path: impl Into<PathBuf>, kind: MemberKind, size: u64) -> Self {
        Self {
            path: path.into(),
            kind,
            size,
        }
    }
}
