//! Output formatter trait for CLI results.

use anyhow::Result;
use serde::Serialize;
use std::net::SocketAddr;
use tmpweb_core::CreatedSite;

/// Common output formatter trait
pub trait OutputFormatter {
    /// Format a newly published site
    fn format_created(&self, created: &CreatedSite) -> Result<()>;

    /// Format the result of a reap sweep
    fn format_reaped(&self, count: usize) -> Result<()>;

    /// Format the result of deleting one site
    fn format_deleted(&self, site_id: &str, existed: bool) -> Result<()>;

    /// Announce that the server is listening
    fn format_listening(&self, addr: SocketAddr) -> Result<()>;

    /// Format error message
    fn format_error(&self, operation: &str, error: &anyhow::Error);
}

/// Generic JSON output structure
#[derive(Debug, Serialize)]
pub struct JsonOutput<T> {
    pub operation: String,
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Success,
    Error,
}

impl<T: Serialize> JsonOutput<T> {
    pub fn success(operation: impl Into<String>, data: T) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Success,
            data: Some(data),
            error: None,
        }
    }
}

impl JsonOutput<()> {
    pub fn error(operation: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            status: Status::Error,
            data: None,
            error: Some(error.into()),
        }
    }
}
