//! Error conversion utilities for CLI.
//!
//! Converts tmpweb-core's typed errors (thiserror) into operator-facing
//! errors (anyhow) with actionable guidance.

use anyhow::anyhow;
use std::path::Path;
use tmpweb_core::ConfigError;
use tmpweb_core::SiteError;

/// Converts `SiteError` to an anyhow error with a hint for the operator.
pub fn convert_site_error(err: SiteError, upload: &Path) -> anyhow::Error {
    match err {
        SiteError::PayloadTooLarge { size, max } => {
            anyhow!(
                "Upload '{}' is too large ({size} bytes, limit {max} bytes)\n\
                 HINT: Raise max_site_size in the config file if this site is legitimate.",
                upload.display()
            )
        }
        SiteError::BadRequest(reason) => {
            anyhow!(
                "Upload '{}' was rejected: {reason}\n\
                 HINT: Supported uploads are zip, tar, tar.gz and single HTML pages starting with <!DOCTYPE.",
                upload.display()
            )
        }
        SiteError::Internal(reason) => {
            anyhow!(
                "Failed to publish '{}': {reason}\n\
                 HINT: Check that web_root and database_location are writable.",
                upload.display()
            )
        }
    }
}

/// Converts `ConfigError` to an anyhow error naming the config file.
pub fn convert_config_error(err: ConfigError, path: &Path) -> anyhow::Error {
    match err {
        ConfigError::Io(io_err) => {
            anyhow!(
                "Cannot read config file '{}': {io_err}\n\
                 HINT: Pass --config to point at the file, or copy config.example.toml.",
                path.display()
            )
        }
        other => anyhow::Error::from(other).context(format!("Invalid config file '{}'", path.display())),
    }
}
