//! Site identity and lifecycle timestamps.

use std::fmt;

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::Serialize;

/// Random bytes behind each generated id (72 bits of entropy).
const SITE_ID_BYTES: usize = 9;

/// Longest id accepted from outside.
const MAX_SITE_ID_LEN: usize = 64;

/// Opaque, URL-safe site identifier.
///
/// Generated ids are 12 characters of URL-safe base64. Ids received from
/// clients or operators are only accepted through [`SiteId::parse`], which
/// admits the same alphabet and nothing else, so a `SiteId` is always safe
/// to use as a single path component.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SiteId(String);

impl SiteId {
    /// Generates a fresh id from the operating system's CSPRNG.
    pub fn generate() -> std::io::Result<Self> {
        let mut bytes = [0u8; SITE_ID_BYTES];
        getrandom::fill(&mut bytes).map_err(std::io::Error::other)?;
        Ok(Self(URL_SAFE_NO_PAD.encode(bytes)))
    }

    /// Accepts an externally supplied id if it uses only the URL-safe base64
    /// alphabet.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpweb_core::SiteId;
    ///
    /// assert!(SiteId::parse("aZ09-_aZ09-_").is_some());
    /// assert!(SiteId::parse("..").is_none());
    /// assert!(SiteId::parse("a/b").is_none());
    /// assert!(SiteId::parse("").is_none());
    /// ```
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= MAX_SITE_ID_LEN
            && raw
                .bytes()
                .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_');
        valid.then(|| Self(raw.to_string()))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for SiteId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A hosted site as recorded in the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Site {
    /// Site identifier, also the directory name under the web root.
    pub site_id: SiteId,
    /// Creation time in epoch seconds.
    pub creation_date: i64,
    /// Expiry time in epoch seconds.
    pub expiry_date: i64,
}

impl Site {
    /// Builds a site created at `now` that lives for `retention_secs`,
    /// clamped to `max_retention_secs`.
    ///
    /// # Examples
    ///
    /// ```
    /// use tmpweb_core::Site;
    /// use tmpweb_core::SiteId;
    ///
    /// let id = SiteId::parse("abc").unwrap();
    /// let site = Site::new(id, 1_000, 500, 100);
    /// assert_eq!(site.expiry_date, 1_100);
    /// ```
    #[must_use]
    pub fn new(site_id: SiteId, now: i64, retention_secs: u64, max_retention_secs: u64) -> Self {
        let retention = i64::try_from(retention_secs.min(max_retention_secs)).unwrap_or(i64::MAX);
        Self {
            site_id,
            creation_date: now,
            expiry_date: now.saturating_add(retention),
        }
    }

    /// Returns `true` once the site is eligible for reaping.
    #[must_use]
    pub const fn is_expired(&self, now: i64) -> bool {
        self.expiry_date < now
    }
}

/// Current time in epoch seconds.
#[must_use]
pub fn unix_now() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX))
}
