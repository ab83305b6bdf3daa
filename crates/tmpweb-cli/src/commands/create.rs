//! Create command implementation.

use crate::cli::CreateArgs;
use crate::error::convert_site_error;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use tmpweb_core::SiteLifecycle;
use tmpweb_core::Upload;

pub async fn execute(
    args: &CreateArgs,
    lifecycle: &SiteLifecycle,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let body = tokio::fs::read(&args.file)
        .await
        .with_context(|| format!("failed to read '{}'", args.file.display()))?;

    let mut upload = Upload::new(body);
    if let Some(days) = args.retention_days {
        upload = upload.with_retention_days(days);
    }
    if let Some(kind) = args.archive_type {
        upload = upload.with_archive_type(kind);
    }

    let created = lifecycle
        .create_site(upload)
        .await
        .map_err(|e| convert_site_error(e, &args.file))?;

    formatter.format_created(&created)
}
