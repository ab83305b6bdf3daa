//! Type-safe wrappers for archive extraction.
//!
//! `DestDir` and `SafePath` can only be built through validation, so code
//! that holds one can join and write without re-checking.

pub mod dest_dir;
pub mod member;
pub mod safe_path;

pub use dest_dir::DestDir;
pub use member::ArchiveMember;
pub use member::MemberKind;
pub use safe_path::PathViolation;
pub use safe_path::SafePath;
