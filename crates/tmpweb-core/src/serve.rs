//! Serve-time lookup of a logical request path.
//!
//! Every candidate file goes through [`resolve_public_path`] before it is
//! touched, so a request can never reach outside the web root.

use std::path::Path;
use std::path::PathBuf;

use crate::SanitizeError;
use crate::SiteId;
use crate::formats::html::INDEX_FILE;
use crate::sanitize::resolve_public_path;

/// How a request path should be answered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServeOutcome {
    /// Serve the bytes of this file.
    File(PathBuf),
    /// Permanently redirect to this logical path.
    Redirect(String),
    /// Nothing servable; answer 404.
    NotFound,
}

/// Resolves a request for `path` inside site `site_id` under `web_root`.
///
/// `path` is everything after the site id: empty for `/abc123`, `/` for
/// `/abc123/`, `/about` for `/abc123/about`. Lookups are confined to
/// `<web_root>/<site_id>`, so `..` can never reach another site.
///
/// - `.html`/`.htm` requests redirect to the extension-less form, and
///   `index.html` redirects to its directory.
/// - Other requests try the exact file, then `<path>.html`, then
///   `<path>/index.html`.
/// - A directory requested without a trailing slash redirects to the
///   slash form.
///
/// Redirect targets are full logical paths including the site id.
/// Sanitization failures are answered as [`ServeOutcome::NotFound`].
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use tmpweb_core::SiteId;
/// use tmpweb_core::serve::ServeOutcome;
/// use tmpweb_core::serve::resolve_request;
///
/// let root = Path::new("/srv/tmpweb/sites");
/// let site = SiteId::parse("abc123").unwrap();
/// assert_eq!(
///     resolve_request(root, &site, "/about.html"),
///     ServeOutcome::Redirect("/abc123/about".into())
/// );
/// ```
pub fn resolve_request(web_root: &Path, site_id: &SiteId, path: &str) -> ServeOutcome {
    let site_root = web_root.join(site_id.as_str());
    let prefix = format!("/{site_id}");
    let inner = if path.is_empty() {
        String::new()
    } else {
        format!("/{}", path.trim_start_matches('/'))
    };

    if let Some(location) = canonical_location(&inner) {
        return ServeOutcome::Redirect(format!("{prefix}{location}"));
    }

    let exact = match lookup(&site_root, &inner) {
        Ok(path) => path,
        Err(outcome) => return outcome,
    };
    if exact.is_file() {
        return ServeOutcome::File(exact);
    }
    if exact.is_dir() {
        if !inner.ends_with('/') {
            return ServeOutcome::Redirect(format!("{prefix}{inner}/"));
        }
        return existing_file(&site_root, &format!("{inner}{INDEX_FILE}"));
    }
    if inner.ends_with('/') || inner.is_empty() {
        return ServeOutcome::NotFound;
    }

    match existing_file(&site_root, &format!("{inner}.html")) {
        ServeOutcome::NotFound => existing_file(&site_root, &format!("{inner}/{INDEX_FILE}")),
        found => found,
    }
}

/// Returns the redirect target for a request that names an HTML file.
fn canonical_location(logical: &str) -> Option<String> {
    let (parent, name) = logical.rsplit_once('/')?;
    let lower = name.to_ascii_lowercase();

    if lower == "index.html" || lower == "index.htm" {
        return Some(format!("{parent}/"));
    }
    let stem_len = if lower.ends_with(".html") {
        name.len() - ".html".len()
    } else if lower.ends_with(".htm") {
        name.len() - ".htm".len()
    } else {
        return None;
    };
    if stem_len == 0 {
        return None;
    }
    Some(format!("{parent}/{}", &name[..stem_len]))
}

fn lookup(site_root: &Path, logical: &str) -> Result<PathBuf, ServeOutcome> {
    resolve_public_path(logical, site_root).map_err(|err| {
        if let SanitizeError::Io(e) = &err {
            tracing::warn!(error = %e, "site directory is not accessible");
        }
        ServeOutcome::NotFound
    })
}

fn existing_file(site_root: &Path, logical: &str) -> ServeOutcome {
    match lookup(site_root, logical) {
        Ok(path) if path.is_file() => ServeOutcome::File(path),
        Ok(_) => ServeOutcome::NotFound,
        Err(outcome) => outcome,
    }
}

/// Content type to send for a file, inferred from its extension.
#[must_use]
pub fn content_type_for(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("html" | "htm") => "text/html; charset=utf-8",
        Some("css") => "text/css; charset=utf-8",
        Some("js" | "mjs") => "application/javascript; charset=utf-8",
        Some("json" | "map") => "application/json; charset=utf-8",
        Some("txt") => "text/plain; charset=utf-8",
        Some("xml") => "application/xml",
        Some("svg") => "image/svg+xml",
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("avif") => "image/avif",
        Some("ico") => "image/x-icon",
        Some("woff") => "font/woff",
        Some("woff2") => "font/woff2",
        Some("ttf") => "font/ttf",
        Some("pdf") => "application/pdf",
        Some("wasm") => "application/wasm",
        Some("mp4") => "video/mp4",
        Some("webm") => "video/webm",
        Some("mp3") => "audio/mpeg",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn site() -> TempDir {
        let root = TempDir::new().unwrap();
        let base = root.path().join("abc123");
        fs::create_dir_all(base.join("docs")).unwrap();
        fs::create_dir_all(base.join("empty")).unwrap();
        fs::write(base.join("index.html"), b"home").unwrap();
        fs::write(base.join("about.html"), b"about").unwrap();
        fs::write(base.join("docs/index.html"), b"docs").unwrap();
        fs::write(base.join("style.css"), b"p{}").unwrap();
        root
    }

    fn id() -> SiteId {
        SiteId::parse("abc123").unwrap()
    }

    fn served(outcome: ServeOutcome) -> Vec<u8> {
        match outcome {
            ServeOutcome::File(path) => fs::read(path).unwrap(),
            other => panic!("expected a file, got {other:?}"),
        }
    }

    #[test]
    fn test_html_extension_redirects() {
        let root = site();
        assert_eq!(
            resolve_request(root.path(), &id(), "/about.html"),
            ServeOutcome::Redirect("/abc123/about".into())
        );
        assert_eq!(
            resolve_request(root.path(), &id(), "/about.HTM"),
            ServeOutcome::Redirect("/abc123/about".into())
        );
    }

    #[test]
    fn test_index_redirects_to_directory() {
        let root = site();
        assert_eq!(
            resolve_request(root.path(), &id(), "/docs/index.html"),
            ServeOutcome::Redirect("/abc123/docs/".into())
        );
    }

    #[test]
    fn test_extensionless_finds_html() {
        let root = site();
        assert_eq!(served(resolve_request(root.path(), &id(), "/about")), b"about");
    }

    #[test]
    fn test_exact_file() {
        let root = site();
        assert_eq!(served(resolve_request(root.path(), &id(), "style.css")), b"p{}");
    }

    #[test]
    fn test_directory_redirects_to_slash() {
        let root = site();
        assert_eq!(
            resolve_request(root.path(), &id(), ""),
            ServeOutcome::Redirect("/abc123/".into())
        );
    }

    #[test]
    fn test_directory_serves_index() {
        let root = site();
        assert_eq!(served(resolve_request(root.path(), &id(), "/")), b"home");
        assert_eq!(served(resolve_request(root.path(), &id(), "/docs/")), b"docs");
    }

    #[test]
    fn test_directory_without_index() {
        let root = site();
        assert_eq!(
            resolve_request(root.path(), &id(), "/empty/"),
            ServeOutcome::NotFound
        );
    }

    #[test]
    fn test_missing_and_traversal_not_found() {
        let root = site();
        assert_eq!(
            resolve_request(root.path(), &id(), "/missing"),
            ServeOutcome::NotFound
        );
        assert_eq!(
            resolve_request(root.path(), &id(), "/../../etc/passwd"),
            ServeOutcome::NotFound
        );
    }

    #[test]
    fn test_parent_segments_stay_inside_site() {
        let root = site();
        let other = root.path().join("zzz999");
        fs::create_dir(&other).unwrap();
        fs::write(other.join("secret.txt"), b"other site").unwrap();
        fs::write(root.path().join("loose.txt"), b"not a site").unwrap();

        assert_eq!(
            resolve_request(root.path(), &id(), "/../zzz999/secret.txt"),
            ServeOutcome::NotFound
        );
        assert_eq!(
            resolve_request(root.path(), &id(), "/docs/../../loose.txt"),
            ServeOutcome::NotFound
        );
        assert_eq!(served(resolve_request(root.path(), &id(), "/docs/../style.css")), b"p{}");
    }

    #[test]
    fn test_missing_site_directory() {
        let root = site();
        let gone = SiteId::parse("gone42").unwrap();
        assert_eq!(resolve_request(root.path(), &gone, "/"), ServeOutcome::NotFound);
    }

    #[test]
    fn test_content_types() {
        assert_eq!(
            content_type_for(Path::new("index.html")),
            "text/html; charset=utf-8"
        );
        assert_eq!(content_type_for(Path::new("logo.PNG")), "image/png");
        assert_eq!(
            content_type_for(Path::new("archive.bin")),
            "application/octet-stream"
        );
        assert_eq!(
            content_type_for(Path::new("noext")),
            "application/octet-stream"
        );
    }
}
