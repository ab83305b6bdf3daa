//! Upload type detection.

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;

/// Zip local file header signature.
const ZIP_LOCAL_MAGIC: [u8; 4] = [0x50, 0x4B, 0x03, 0x04];

/// Zip central directory signature (archives with no local entries first).
const ZIP_CENTRAL_MAGIC: [u8; 4] = [0x50, 0x4B, 0x01, 0x02];

/// Case-insensitive prefix identifying a raw HTML page.
const HTML_DOCTYPE: &[u8; 9] = b"<!doctype";

/// Kinds of upload this crate can turn into a site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArchiveKind {
    /// ZIP archive.
    Zip,
    /// Tar archive, optionally gzip-compressed.
    Tar,
    /// Single HTML page served as `index.html`.
    Html,
}

impl ArchiveKind {
    /// Returns the lowercase name used in config files and on the CLI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
            Self::Tar => "tar",
            Self::Html => "html",
        }
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArchiveKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "zip" => Ok(Self::Zip),
            "tar" => Ok(Self::Tar),
            "html" => Ok(Self::Html),
            other => Err(format!("unknown archive type '{other}' (expected zip, tar or html)")),
        }
    }
}

/// Guesses the kind of an upload from its leading bytes.
///
/// Zip and HTML have recognizable prefixes; anything else is assumed to be
/// tar and left for the tar reader to accept or refuse.
///
/// # Examples
///
/// ```
/// use tmpweb_core::ArchiveKind;
/// use tmpweb_core::formats::sniff;
///
/// assert_eq!(sniff(b"PK\x03\x04rest"), ArchiveKind::Zip);
/// assert_eq!(sniff(b"<!DOCTYPE html><p>hi"), ArchiveKind::Html);
/// assert_eq!(sniff(b"site/index.html\0\0\0"), ArchiveKind::Tar);
/// ```
#[must_use]
pub fn sniff(data: &[u8]) -> ArchiveKind {
    if data.starts_with(&ZIP_LOCAL_MAGIC) || data.starts_with(&ZIP_CENTRAL_MAGIC) {
        return ArchiveKind::Zip;
    }
    if data.len() >= HTML_DOCTYPE.len()
        && data[..HTML_DOCTYPE.len()].eq_ignore_ascii_case(HTML_DOCTYPE)
    {
        return ArchiveKind::Html;
    }
    ArchiveKind::Tar
}

/// Picks the kind to extract as: a declared kind wins, otherwise sniff.
#[must_use]
pub fn resolve_kind(declared: Option<ArchiveKind>, data: &[u8]) -> ArchiveKind {
    declared.unwrap_or_else(|| sniff(data))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_zip_local_header() {
        assert_eq!(sniff(&[0x50, 0x4B, 0x03, 0x04, 0x14]), ArchiveKind::Zip);
    }

    #[test]
    fn test_sniff_zip_central_directory() {
        assert_eq!(sniff(&[0x50, 0x4B, 0x01, 0x02]), ArchiveKind::Zip);
    }

    #[test]
    fn test_sniff_empty_zip_is_not_zip() {
        // End-of-central-directory only; the tar reader will refuse it.
        assert_eq!(sniff(&[0x50, 0x4B, 0x05, 0x06]), ArchiveKind::Tar);
    }

    #[test]
    fn test_sniff_doctype_case_insensitive() {
        assert_eq!(sniff(b"<!DOCTYPE html>"), ArchiveKind::Html);
        assert_eq!(sniff(b"<!doctype html>"), ArchiveKind::Html);
        assert_eq!(sniff(b"<!DocType html>"), ArchiveKind::Html);
    }

    #[test]
    fn test_sniff_html_without_doctype_is_tar() {
        assert_eq!(sniff(b"<html><body>"), ArchiveKind::Tar);
    }

    #[test]
    fn test_sniff_short_input() {
        assert_eq!(sniff(b""), ArchiveKind::Tar);
        assert_eq!(sniff(b"<!doc"), ArchiveKind::Tar);
        assert_eq!(sniff(b"PK"), ArchiveKind::Tar);
    }

    #[test]
    fn test_declared_kind_wins() {
        assert_eq!(
            resolve_kind(Some(ArchiveKind::Tar), b"PK\x03\x04"),
            ArchiveKind::Tar
        );
        assert_eq!(resolve_kind(None, b"PK\x03\x04"), ArchiveKind::Zip);
    }

    #[test]
    fn test_from_str() {
        assert_eq!("ZIP".parse::<ArchiveKind>().unwrap(), ArchiveKind::Zip);
        assert_eq!("html".parse::<ArchiveKind>().unwrap(), ArchiveKind::Html);
        assert!("7z".parse::<ArchiveKind>().is_err());
    }

    #[test]
    fn test_display_round_trips_through_from_str() {
        for kind in [ArchiveKind::Zip, ArchiveKind::Tar, ArchiveKind::Html] {
            assert_eq!(kind.to_string().parse::<ArchiveKind>().unwrap(), kind);
        }
    }
}
