//! Archive ingestion and site lifecycle for temporary static site hosting.
//!
//! `tmpweb-core` turns an untrusted upload (zip, tar or a single HTML page)
//! into a temporary public site. Archives are unpacked with protection
//! against path traversal, link and device-node injection, and
//! decompression bombs; the servable root is located; and the site is
//! recorded in a SQLite registry so it can be reaped once it expires.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use tmpweb_core::SiteConfig;
//! use tmpweb_core::SiteLifecycle;
//! use tmpweb_core::SqliteRegistry;
//! use tmpweb_core::Upload;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = SiteConfig::load("config.toml")?;
//! let registry = SqliteRegistry::open(&config.database_location).await?;
//! let lifecycle = SiteLifecycle::new(Arc::new(config), registry);
//!
//! let page = b"<!DOCTYPE html><p>hello</p>".to_vec();
//! let created = lifecycle.create_site(Upload::new(page)).await?;
//! println!("site available at {}", created.url);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod copy;
pub mod error;
pub mod extraction;
pub mod formats;
pub mod lifecycle;
pub mod multipart;
pub mod registry;
pub mod report;
pub mod sanitize;
pub mod security;
pub mod serve;
pub mod site;
pub mod test_utils;
pub mod types;
pub mod webroot;

// Re-export main API types
pub use config::ExtractionConfig;
pub use config::SiteConfig;
pub use error::ConfigError;
pub use error::ExtractionError;
pub use error::MultipartError;
pub use error::QuotaResource;
pub use error::RegistryError;
pub use error::ResolveError;
pub use error::Result;
pub use error::SanitizeError;
pub use error::SiteError;
pub use extraction::SafeArchiveExtractor;
pub use formats::ArchiveKind;
pub use lifecycle::CreatedSite;
pub use lifecycle::SiteLifecycle;
pub use lifecycle::Upload;
pub use registry::SiteRegistry;
pub use registry::SqliteRegistry;
pub use report::ExtractionReport;
pub use sanitize::resolve_public_path;
pub use site::Site;
pub use site::SiteId;
pub use webroot::resolve_web_root;

// Re-export types module for easier access
pub use types::ArchiveMember;
pub use types::DestDir;
pub use types::MemberKind;
pub use types::SafePath;
