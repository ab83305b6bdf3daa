//! Delete command implementation.

use crate::cli::DeleteArgs;
use crate::output::OutputFormatter;
use anyhow::Context;
use anyhow::Result;
use anyhow::bail;
use tmpweb_core::SiteId;
use tmpweb_core::SiteLifecycle;

/// Deletes each named site. Ids are validated up front so a typo in the
/// last argument does not leave the earlier ones half-processed.
pub async fn execute(
    args: &DeleteArgs,
    lifecycle: &SiteLifecycle,
    formatter: &dyn OutputFormatter,
) -> Result<()> {
    let mut site_ids = Vec::with_capacity(args.site_ids.len());
    for raw in &args.site_ids {
        let Some(site_id) = SiteId::parse(raw) else {
            bail!(
                "'{raw}' is not a valid site id\n\
                 HINT: Site ids are the first path segment of the site URL."
            );
        };
        site_ids.push(site_id);
    }

    for site_id in &site_ids {
        let existed = lifecycle
            .delete_site(site_id)
            .await
            .with_context(|| format!("failed to delete site {site_id}"))?;
        formatter.format_deleted(site_id.as_str(), existed)?;
    }
    Ok(())
}
