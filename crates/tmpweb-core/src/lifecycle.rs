//! Site creation, expiry and deletion.
//!
//! [`SiteLifecycle`] is the only place where the extractor, the web-root
//! resolver, the public tree and the registry meet. Every failure below it
//! is translated into a [`SiteError`], and every exit path leaves either a
//! complete site (directory plus row) or nothing at all.

use std::fs;
use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;
use walkdir::WalkDir;

use crate::ExtractionConfig;
use crate::ExtractionReport;
use crate::SafeArchiveExtractor;
use crate::SiteConfig;
use crate::SiteError;
use crate::formats::ArchiveKind;
use crate::formats::resolve_kind;
use crate::multipart::unwrap_multipart;
use crate::registry::SiteRegistry;
use crate::registry::SqliteRegistry;
use crate::site::Site;
use crate::site::SiteId;
use crate::site::unix_now;
use crate::webroot::resolve_web_root;

const MULTIPART_FORM_DATA: &str = "multipart/form-data";

/// An upload as received from a client.
#[derive(Debug, Clone, Default)]
pub struct Upload {
    /// Raw request body.
    pub body: Vec<u8>,
    /// Length the client declared, if any.
    pub content_length: Option<u64>,
    /// Declared content type, if any.
    pub content_type: Option<String>,
    /// Requested retention in seconds; the configured default otherwise.
    pub retention_secs: Option<u64>,
    /// Forces the archive kind instead of sniffing.
    pub archive_type: Option<ArchiveKind>,
}

impl Upload {
    /// Wraps a body with no declared metadata.
    #[must_use]
    pub fn new(body: Vec<u8>) -> Self {
        Self {
            body,
            ..Self::default()
        }
    }

    /// Sets the declared content length.
    #[must_use]
    pub fn with_content_length(mut self, length: u64) -> Self {
        self.content_length = Some(length);
        self
    }

    /// Sets the declared content type.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Requests a retention period in days.
    #[must_use]
    pub fn with_retention_days(mut self, days: u64) -> Self {
        self.retention_secs = Some(days.saturating_mul(24 * 3600));
        self
    }

    /// Forces the archive kind.
    #[must_use]
    pub fn with_archive_type(mut self, kind: ArchiveKind) -> Self {
        self.archive_type = Some(kind);
        self
    }

    fn is_multipart(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.to_ascii_lowercase().contains(MULTIPART_FORM_DATA))
    }
}

/// Outcome of a successful [`SiteLifecycle::create_site`].
#[derive(Debug, Clone)]
pub struct CreatedSite {
    /// Public URL of the new site.
    pub url: String,
    /// The registry row that was written.
    pub site: Site,
    /// What the extractor did.
    pub report: ExtractionReport,
}

/// Coordinates extraction, the public tree and the registry.
#[derive(Debug, Clone)]
pub struct SiteLifecycle<R = SqliteRegistry> {
    config: Arc<SiteConfig>,
    registry: R,
}

impl<R: SiteRegistry> SiteLifecycle<R> {
    /// Creates an orchestrator over `registry`.
    pub fn new(config: Arc<SiteConfig>, registry: R) -> Self {
        Self { config, registry }
    }

    /// Shared configuration.
    pub fn config(&self) -> &SiteConfig {
        &self.config
    }

    /// The underlying registry.
    pub fn registry(&self) -> &R {
        &self.registry
    }

    /// Directory a site lives in.
    pub fn site_dir(&self, site_id: &SiteId) -> PathBuf {
        self.config.web_root.join(site_id.as_str())
    }

    /// Turns an upload into a live site and returns its URL.
    ///
    /// The upload is extracted into a private scratch directory, its web
    /// root is located and moved to `<web_root>/<site_id>`, and the registry
    /// row is written. If the row cannot be written the moved directory is
    /// removed again. The scratch directory is removed on every path.
    ///
    /// # Errors
    ///
    /// - [`SiteError::PayloadTooLarge`] if the declared or actual body size,
    ///   or the unpacked size, exceeds `max_site_size`
    /// - [`SiteError::BadRequest`] for malformed multipart bodies, bad or
    ///   unsupported archives, and archives with nothing to serve
    /// - [`SiteError::Internal`] for filesystem and database failures
    pub async fn create_site(&self, upload: Upload) -> Result<CreatedSite, SiteError> {
        let max = self.config.max_site_size;
        if let Some(declared) = upload.content_length
            && declared > max
        {
            tracing::error!(declared, max, "upload rejected, declared size too large");
            return Err(SiteError::PayloadTooLarge {
                size: declared,
                max,
            });
        }
        let actual = upload.body.len() as u64;
        let allowed = upload.content_length.map_or(max, |declared| declared.min(max));
        if actual > allowed {
            tracing::error!(actual, allowed, "upload rejected, body larger than allowed");
            return Err(SiteError::PayloadTooLarge {
                size: actual,
                max: allowed,
            });
        }

        let payload = if upload.is_multipart() {
            tracing::debug!("unwrapping multipart/form-data");
            unwrap_multipart(&upload.body)?.to_vec()
        } else {
            upload.body
        };
        let kind = resolve_kind(upload.archive_type.or(self.config.archive_type), &payload);

        let site_id = SiteId::generate().map_err(|e| internal("failed to generate site id", &e))?;
        let retention = upload
            .retention_secs
            .unwrap_or_else(|| self.config.default_retention_secs());
        let site = Site::new(
            site_id,
            unix_now(),
            retention,
            self.config.max_retention_secs(),
        );
        let target = self.site_dir(&site.site_id);

        let job = StagingJob {
            payload,
            kind,
            limits: self.config.extraction_config(),
            scratch_dir: self.config.scratch_dir.clone(),
            target: target.clone(),
        };
        let report = tokio::task::spawn_blocking(move || job.run())
            .await
            .map_err(|e| internal("staging task failed", &e))??;

        if let Err(err) = self.registry.insert(&site).await {
            tracing::error!(
                site_id = %site.site_id,
                error = %err,
                "failed to record site, removing its directory"
            );
            if let Err(cleanup) = tokio::fs::remove_dir_all(&target).await {
                tracing::error!(
                    site_id = %site.site_id,
                    error = %cleanup,
                    "failed to remove directory of unrecorded site"
                );
            }
            return Err(err.into());
        }

        let url = self.config.site_url(site.site_id.as_str());
        tracing::info!(
            site_id = %site.site_id,
            %url,
            kind = %kind,
            files = report.files_extracted,
            items = report.total_items(),
            bytes = report.bytes_written,
            expiry = site.expiry_date,
            "created site"
        );
        Ok(CreatedSite { url, site, report })
    }

    /// Deletes every site that expired before `now`. Returns how many rows
    /// were removed.
    ///
    /// A site whose directory cannot be removed is logged and its row is
    /// removed anyway; a row that cannot be removed is logged and skipped.
    /// Running this twice with the same `now` removes nothing the second
    /// time.
    pub async fn reap_expired(&self, now: i64) -> Result<usize, SiteError> {
        tracing::info!("deleting expired sites");
        let expired = self.registry.list_expired(now).await?;

        let mut reaped = 0;
        for site_id in expired {
            tracing::info!(%site_id, "deleting site");
            self.remove_site_dir(&site_id).await;
            match self.registry.delete(&site_id).await {
                Ok(true) => reaped += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(%site_id, error = %err, "failed to delete registry row");
                }
            }
        }
        Ok(reaped)
    }

    /// Deletes one site regardless of its expiry.
    ///
    /// Returns `false` if the registry had no such site.
    pub async fn delete_site(&self, site_id: &SiteId) -> Result<bool, SiteError> {
        self.remove_site_dir(site_id).await;
        let existed = self.registry.delete(site_id).await?;
        if existed {
            tracing::info!(%site_id, "deleted site");
        } else {
            tracing::warn!(%site_id, "no such site in registry");
        }
        Ok(existed)
    }

    /// Returns the site if it is registered and not yet expired at `now`.
    pub async fn live_site(&self, site_id: &SiteId, now: i64) -> Result<Option<Site>, SiteError> {
        let site = self.registry.get(site_id).await?;
        Ok(site.filter(|s| !s.is_expired(now)))
    }

    async fn remove_site_dir(&self, site_id: &SiteId) {
        let dir = self.site_dir(site_id);
        match tokio::fs::remove_dir_all(&dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                tracing::warn!(%site_id, "site directory already gone");
            }
            Err(e) => {
                tracing::error!(%site_id, error = %e, "failed to remove site directory");
            }
        }
    }
}

/// The blocking part of a create: extract, locate the root, publish.
struct StagingJob {
    payload: Vec<u8>,
    kind: ArchiveKind,
    limits: ExtractionConfig,
    scratch_dir: Option<PathBuf>,
    target: PathBuf,
}

impl StagingJob {
    fn run(self) -> Result<ExtractionReport, SiteError> {
        let scratch = match &self.scratch_dir {
            Some(dir) => TempDir::new_in(dir),
            None => TempDir::new(),
        }
        .map_err(|e| internal("failed to create scratch directory", &e))?;

        let report = SafeArchiveExtractor::new(&self.limits)
            .extract(&self.payload, self.kind, scratch.path())
            .inspect_err(|e| tracing::error!(error = %e, kind = %self.kind, "extraction failed"))?;

        let root = resolve_web_root(scratch.path())
            .inspect_err(|e| tracing::error!(error = %e, "no web root in upload"))?;

        if self.target.exists() {
            return Err(SiteError::Internal(format!(
                "site directory {} already exists",
                self.target.display()
            )));
        }
        publish(&root, &self.target).map_err(|e| internal("failed to publish site", &e))?;
        Ok(report)
    }
}

/// Moves `src` to `dst`, falling back to copy-and-delete across
/// filesystems, and makes `dst` readable by the web server.
fn publish(src: &Path, dst: &Path) -> io::Result<()> {
    publish_with(src, dst, make_world_readable)
}

/// Places `src` at `dst`, then runs `finish` on it. Once `dst` exists any
/// later failure removes it again, so an error never leaves a directory
/// without a registry row.
fn publish_with(
    src: &Path,
    dst: &Path,
    finish: impl FnOnce(&Path) -> io::Result<()>,
) -> io::Result<()> {
    match fs::rename(src, dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            tracing::debug!("scratch directory is on another filesystem, copying");
            copy_tree(src, dst).inspect_err(|_| discard(dst))?;
            // The scratch TempDir retries on drop.
            if let Err(e) = fs::remove_dir_all(src) {
                tracing::warn!(error = %e, "failed to remove copied scratch tree");
            }
        }
        Err(e) => return Err(e),
    }
    finish(dst).inspect_err(|_| discard(dst))
}

fn discard(dst: &Path) {
    match fs::remove_dir_all(dst) {
        Ok(()) => {}
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::error!(
                path = %dst.display(),
                error = %e,
                "failed to remove partially published site"
            );
        }
    }
}

fn copy_tree(src: &Path, dst: &Path) -> io::Result<()> {
    for entry in WalkDir::new(src).follow_links(false) {
        let entry = entry.map_err(io::Error::other)?;
        let relative = entry.path().strip_prefix(src).map_err(io::Error::other)?;
        let target = dst.join(relative);
        let file_type = entry.file_type();
        if file_type.is_dir() {
            fs::create_dir_all(&target)?;
        } else if file_type.is_file() {
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}

// Scratch directories are created owner-only; the site root must be
// readable by the web server.
#[cfg(unix)]
fn make_world_readable(dir: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(dir, fs::Permissions::from_mode(0o755))
}

#[cfg(not(unix))]
fn make_world_readable(_dir: &Path) -> io::Result<()> {
    Ok(())
}

fn internal(context: &str, err: &dyn std::fmt::Display) -> SiteError {
    tracing::error!(error = %err, "{context}");
    SiteError::Internal(format!("{context}: {err}"))
}
