//! JSON output formatter for machine-readable results.

use super::formatter::JsonOutput;
use super::formatter::OutputFormatter;
use anyhow::Result;
use serde::Serialize;
use std::io::Write;
use std::io::{self};
use std::net::SocketAddr;
use tmpweb_core::CreatedSite;

pub struct JsonFormatter;

impl JsonFormatter {
    fn output<T: Serialize>(value: &T) -> Result<()> {
        let json = serde_json::to_string_pretty(value)?;
        writeln!(io::stdout(), "{json}")?;
        Ok(())
    }
}

#[derive(Serialize)]
struct CreatedOutput<'a> {
    url: &'a str,
    site_id: &'a str,
    creation_date: i64,
    expiry_date: i64,
    files_extracted: usize,
    directories_created: usize,
    total_items: usize,
    bytes_written: u64,
    members_blocked: usize,
    entries_swept: usize,
    duration_ms: u128,
}

impl<'a> From<&'a CreatedSite> for CreatedOutput<'a> {
    fn from(created: &'a CreatedSite) -> Self {
        Self {
            url: &created.url,
            site_id: created.site.site_id.as_str(),
            creation_date: created.site.creation_date,
            expiry_date: created.site.expiry_date,
            files_extracted: created.report.files_extracted,
            directories_created: created.report.directories_created,
            total_items: created.report.total_items(),
            bytes_written: created.report.bytes_written,
            members_blocked: created.report.members_blocked,
            entries_swept: created.report.entries_swept,
            duration_ms: created.report.duration.as_millis(),
        }
    }
}

impl OutputFormatter for JsonFormatter {
    fn format_created(&self, created: &CreatedSite) -> Result<()> {
        Self::output(&JsonOutput::success("create", CreatedOutput::from(created)))
    }

    fn format_reaped(&self, count: usize) -> Result<()> {
        #[derive(Serialize)]
        struct ReapOutput {
            deleted: usize,
        }

        Self::output(&JsonOutput::success("reap", ReapOutput { deleted: count }))
    }

    fn format_deleted(&self, site_id: &str, existed: bool) -> Result<()> {
        #[derive(Serialize)]
        struct DeleteOutput<'a> {
            site_id: &'a str,
            existed: bool,
        }

        Self::output(&JsonOutput::success(
            "delete",
            DeleteOutput { site_id, existed },
        ))
    }

    fn format_listening(&self, addr: SocketAddr) -> Result<()> {
        #[derive(Serialize)]
        struct ListenOutput {
            address: String,
        }

        Self::output(&JsonOutput::success(
            "serve",
            ListenOutput {
                address: addr.to_string(),
            },
        ))
    }

    fn format_error(&self, operation: &str, error: &anyhow::Error) {
        let output = JsonOutput::error(operation, format!("{error:#}"));
        let _ = Self::output(&output);
    }
}
