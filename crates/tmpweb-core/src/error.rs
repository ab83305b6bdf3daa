//! Error types for archive ingestion and site lifecycle operations.

use thiserror::Error;

/// Result type alias using `ExtractionError`.
pub type Result<T> = std::result::Result<T, ExtractionError>;

/// Represents a specific extraction ceiling that was exceeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuotaResource {
    /// Total size of written files exceeded the ceiling.
    TotalSize {
        /// Bytes written (or about to be written).
        current: u64,
        /// Maximum allowed total size in bytes.
        max: u64,
    },
    /// Number of written files exceeded the ceiling.
    FileCount {
        /// Current file count.
        current: usize,
        /// Maximum allowed file count.
        max: usize,
    },
    /// Integer overflow detected in size accounting.
    IntegerOverflow,
}

impl std::fmt::Display for QuotaResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::TotalSize { current, max } => {
                write!(f, "unpacked archive too large ({current} > {max} bytes)")
            }
            Self::FileCount { current, max } => {
                write!(f, "archive contains too many files ({current} > {max})")
            }
            Self::IntegerOverflow => {
                write!(f, "integer overflow in size accounting")
            }
        }
    }
}

/// Errors that can occur while extracting an uploaded archive.
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Upload is neither a zip, a tar, nor an HTML page.
    #[error("unsupported archive format")]
    UnsupportedFormat,

    /// Archive container is corrupt.
    #[error("bad archive: {0}")]
    BadArchive(String),

    /// A size or count ceiling was exceeded.
    #[error("{resource}")]
    TooLarge {
        /// Which ceiling was exceeded.
        resource: QuotaResource,
    },
}

impl ExtractionError {
    /// Returns `true` if the upload itself is at fault.
    ///
    /// Client errors are reported back to the uploader; anything else is an
    /// internal failure whose details stay in the logs.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpweb_core::ExtractionError;
    ///
    /// assert!(ExtractionError::UnsupportedFormat.is_client_error());
    ///
    /// let io = std::io::Error::other("disk full");
    /// assert!(!ExtractionError::Io(io).is_client_error());
    /// ```
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Io(_))
    }

    /// Returns the exceeded ceiling, if applicable.
    #[must_use]
    pub const fn quota_resource(&self) -> Option<&QuotaResource> {
        match self {
            Self::TooLarge { resource } => Some(resource),
            _ => None,
        }
    }
}

/// Errors from locating the servable root of an extracted tree.
#[derive(Error, Debug)]
pub enum ResolveError {
    /// The tree holds no files, only (possibly nested) wrapper directories.
    #[error("no servable files found in archive")]
    NoServableContent,

    /// Reading the extracted tree failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from sanitizing a client-supplied path.
#[derive(Error, Debug)]
pub enum SanitizeError {
    /// The requested path resolves outside the public root.
    ///
    /// Deliberately carries no path so it can be surfaced without echoing
    /// the rejected input.
    #[error("requested path is outside the public root")]
    OutOfBounds,

    /// The public root itself could not be resolved.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the site registry.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// Underlying database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A row with this site id already exists.
    #[error("site id already registered: {site_id}")]
    DuplicateId {
        /// The colliding id.
        site_id: String,
    },
}

/// Errors from unwrapping a `multipart/form-data` body.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipartError {
    /// The body has no boundary line.
    #[error("multipart body has no boundary line")]
    MissingBoundary,

    /// The first part has no blank line ending its headers.
    #[error("multipart part has no header terminator")]
    MissingHeaders,

    /// The closing boundary of the first part was not found.
    #[error("multipart part is not terminated by its boundary")]
    Unterminated,
}

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid TOML or has wrong types.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config values are inconsistent.
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors surfaced by site lifecycle operations.
///
/// This is the boundary taxonomy: every archive, filesystem and database
/// failure is translated into one of these variants before it leaves
/// [`SiteLifecycle`](crate::SiteLifecycle).
#[derive(Error, Debug)]
pub enum SiteError {
    /// Declared or actual upload size exceeds `max_site_size`.
    #[error("upload too large ({size} > {max} bytes)")]
    PayloadTooLarge {
        /// Offending size in bytes.
        size: u64,
        /// Configured maximum.
        max: u64,
    },

    /// Upload is malformed, unsupported, or has nothing to serve.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Filesystem or database failure. The message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SiteError {
    /// Returns the message that may be shown to an untrusted client.
    ///
    /// Internal errors collapse to a generic message.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpweb_core::SiteError;
    ///
    /// let err = SiteError::Internal("database is locked".into());
    /// assert_eq!(err.public_message(), "internal server error");
    ///
    /// let err = SiteError::BadRequest("bad zip file".into());
    /// assert_eq!(err.public_message(), "bad request: bad zip file");
    /// ```
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Returns `true` if the client is at fault.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        !matches!(self, Self::Internal(_))
    }
}

impl From<ExtractionError> for SiteError {
    fn from(err: ExtractionError) -> Self {
        if let Some(&QuotaResource::TotalSize { current, max }) = err.quota_resource() {
            return Self::PayloadTooLarge { size: current, max };
        }
        match err {
            ExtractionError::Io(e) => Self::Internal(format!("extraction failed: {e}")),
            other => Self::BadRequest(other.to_string()),
        }
    }
}

impl From<ResolveError> for SiteError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::NoServableContent => Self::BadRequest(err.to_string()),
            ResolveError::Io(e) => Self::Internal(format!("failed to scan extracted tree: {e}")),
        }
    }
}

impl From<MultipartError> for SiteError {
    fn from(err: MultipartError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<RegistryError> for SiteError {
    fn from(err: RegistryError) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ExtractionError::UnsupportedFormat;
        assert_eq!(err.to_string(), "unsupported archive format");
    }

    #[test]
    fn test_too_large_display() {
        let err = ExtractionError::TooLarge {
            resource: QuotaResource::TotalSize {
                current: 2048,
                max: 1024,
            },
        };
        let display = err.to_string();
        assert!(display.contains("too large"));
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));
        assert!(err.quota_resource().is_some());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: ExtractionError = io_err.into();
        assert!(matches!(err, ExtractionError::Io(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_site_error_from_extraction() {
        let err: SiteError = ExtractionError::BadArchive("Bad zip file".into()).into();
        assert!(matches!(err, SiteError::BadRequest(_)));

        let err: SiteError = ExtractionError::TooLarge {
            resource: QuotaResource::TotalSize {
                current: 11,
                max: 10,
            },
        }
        .into();
        assert!(matches!(
            err,
            SiteError::PayloadTooLarge { size: 11, max: 10 }
        ));

        let err: SiteError = ExtractionError::TooLarge {
            resource: QuotaResource::FileCount {
                current: 11,
                max: 10,
            },
        }
        .into();
        assert!(matches!(err, SiteError::BadRequest(_)));

        let err: SiteError = ExtractionError::Io(std::io::Error::other("disk full")).into();
        assert!(matches!(err, SiteError::Internal(_)));
    }

    #[test]
    fn test_internal_error_does_not_leak() {
        let err = SiteError::Internal("/srv/tmpweb/db.sqlite: disk I/O error".into());
        assert!(!err.public_message().contains("/srv"));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_out_of_bounds_has_no_path() {
        let err = SanitizeError::OutOfBounds;
        assert!(!err.to_string().contains(".."));
    }

    #[test]
    fn test_resolve_error_mapping() {
        let err: SiteError = ResolveError::NoServableContent.into();
        assert!(matches!(err, SiteError::BadRequest(_)));
    }
}
