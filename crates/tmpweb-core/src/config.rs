//! Service configuration.

use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;

use crate::ConfigError;
use crate::formats::ArchiveKind;

const MIB: u64 = 1024 * 1024;
const SECS_PER_DAY: u64 = 24 * 3600;

/// Configuration for the hosting service.
///
/// Loaded once at startup and shared read-only (usually behind an `Arc`)
/// by every request handler and the reaper.
///
/// # Examples
///
/// ```
/// use tmpweb_core::SiteConfig;
///
/// let config: SiteConfig = toml::from_str(
///     r#"
///     web_root = "/srv/tmpweb/sites"
///     database_location = "/srv/tmpweb/sites.db"
///     domain = "https://tmp.example.org"
///     "#,
/// )
/// .unwrap();
///
/// assert_eq!(config.max_site_size, 100 * 1024 * 1024);
/// assert_eq!(config.default_retention_secs(), 7 * 24 * 3600);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory under which each site lives as `<web_root>/<site_id>`.
    pub web_root: PathBuf,

    /// Path of the SQLite registry file.
    pub database_location: PathBuf,

    /// Public URL prefix, without trailing slash.
    pub domain: String,

    /// Upper bound in bytes on both the upload and the unpacked tree.
    #[serde(default = "default_max_site_size")]
    pub max_site_size: u64,

    /// Number of files an archive may unpack to.
    #[serde(default = "default_max_file_count")]
    pub max_file_count: usize,

    /// Retention in days when the client does not ask for one.
    #[serde(default = "default_retention_days")]
    pub default_retention: u64,

    /// Ceiling in days on client-requested retention.
    #[serde(default = "default_max_retention_days")]
    pub max_retention: u64,

    /// Forces every upload to be treated as this kind instead of sniffing.
    #[serde(default)]
    pub archive_type: Option<ArchiveKind>,

    /// Where scratch directories are created. Defaults to the system
    /// temporary directory.
    #[serde(default)]
    pub scratch_dir: Option<PathBuf>,
}

const fn default_max_site_size() -> u64 {
    100 * MIB
}

const fn default_max_file_count() -> usize {
    10_000
}

const fn default_retention_days() -> u64 {
    7
}

const fn default_max_retention_days() -> u64 {
    28
}

/// Extraction ceilings derived from [`SiteConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionConfig {
    /// Maximum total bytes written across all files.
    pub max_total_size: u64,

    /// Maximum number of files written.
    pub max_file_count: usize,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_total_size: default_max_site_size(),
            max_file_count: default_max_file_count(),
        }
    }
}

impl SiteConfig {
    /// Creates a configuration with default limits.
    pub fn new(
        web_root: impl Into<PathBuf>,
        database_location: impl Into<PathBuf>,
        domain: impl Into<String>,
    ) -> Self {
        Self {
            web_root: web_root.into(),
            database_location: database_location.into(),
            domain: domain.into(),
            max_site_size: default_max_site_size(),
            max_file_count: default_max_file_count(),
            default_retention: default_retention_days(),
            max_retention: default_max_retention_days(),
            archive_type: None,
            scratch_dir: None,
        }
    }

    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path.as_ref())?;
        let config: Self = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field consistency.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.domain.is_empty() {
            return Err(ConfigError::Invalid("domain must not be empty".into()));
        }
        if self.domain.ends_with('/') {
            return Err(ConfigError::Invalid(
                "domain must not end with '/'".into(),
            ));
        }
        if self.web_root.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("web_root must not be empty".into()));
        }
        if self.max_site_size == 0 {
            return Err(ConfigError::Invalid(
                "max_site_size must be greater than zero".into(),
            ));
        }
        if self.max_file_count == 0 {
            return Err(ConfigError::Invalid(
                "max_file_count must be greater than zero".into(),
            ));
        }
        if self.default_retention > self.max_retention {
            return Err(ConfigError::Invalid(format!(
                "default_retention ({} days) exceeds max_retention ({} days)",
                self.default_retention, self.max_retention
            )));
        }
        Ok(())
    }

    /// Default retention in seconds.
    #[must_use]
    pub fn default_retention_secs(&self) -> u64 {
        self.default_retention.saturating_mul(SECS_PER_DAY)
    }

    /// Maximum retention in seconds.
    #[must_use]
    pub fn max_retention_secs(&self) -> u64 {
        self.max_retention.saturating_mul(SECS_PER_DAY)
    }

    /// Extraction ceilings for one upload.
    #[must_use]
    pub fn extraction_config(&self) -> ExtractionConfig {
        ExtractionConfig {
            max_total_size: self.max_site_size,
            max_file_count: self.max_file_count,
        }
    }

    /// Public URL of a site.
    #[must_use]
    pub fn site_url(&self, site_id: &str) -> String {
        format!("{}/{site_id}/", self.domain)
    }
}
