//! Reap command implementation.

use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use tmpweb_core::SiteLifecycle;
use tmpweb_core::site::unix_now;

pub async fn execute(lifecycle: &SiteLifecycle, formatter: &dyn OutputFormatter) -> Result<()> {
    let count = lifecycle
        .reap_expired(unix_now())
        .await
        .context("failed to reap expired sites")?;
    formatter.format_reaped(count)
}
