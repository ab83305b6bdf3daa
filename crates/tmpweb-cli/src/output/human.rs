//! Human-readable output formatter with colors and styling.

use super::formatter::OutputFormatter;
use anyhow::Result;
use console::Term;
use console::style;
use std::net::SocketAddr;
use tmpweb_core::CreatedSite;

pub struct HumanFormatter {
    verbose: bool,
    quiet: bool,
    use_colors: bool,
    term: Term,
}

impl HumanFormatter {
    pub fn new(verbose: bool, quiet: bool) -> Self {
        Self {
            verbose,
            quiet,
            use_colors: console::colors_enabled(),
            term: Term::stdout(),
        }
    }

    fn format_size(bytes: u64) -> String {
        const KB: u64 = 1024;
        const MB: u64 = KB * 1024;
        const GB: u64 = MB * 1024;

        if bytes >= GB {
            format!("{:.1} GB", bytes as f64 / GB as f64)
        } else if bytes >= MB {
            format!("{:.1} MB", bytes as f64 / MB as f64)
        } else if bytes >= KB {
            format!("{:.1} KB", bytes as f64 / KB as f64)
        } else {
            format!("{bytes} B")
        }
    }

    fn success_line(&self, message: &str) {
        if self.use_colors {
            let _ = self
                .term
                .write_line(&format!("{} {message}", style("✓").green().bold()));
        } else {
            let _ = self.term.write_line(message);
        }
    }
}

impl OutputFormatter for HumanFormatter {
    fn format_created(&self, created: &CreatedSite) -> Result<()> {
        // The URL is the result; print it even when quiet.
        if self.quiet {
            self.term.write_line(&created.url)?;
            return Ok(());
        }

        self.success_line(&format!("Site available at {}", created.url));
        let report = &created.report;
        let _ = self.term.write_line(&format!(
            "  Files:      {} ({} items with directories)",
            report.files_extracted,
            report.total_items()
        ));
        let _ = self.term.write_line(&format!(
            "  Total size: {}",
            Self::format_size(report.bytes_written)
        ));
        let _ = self
            .term
            .write_line(&format!("  Expires:    {} (epoch seconds)", created.site.expiry_date));

        if report.had_rejections() {
            let message = format!(
                "{} member(s) blocked, {} entr(ies) removed after extraction",
                report.members_blocked, report.entries_swept
            );
            if self.use_colors {
                let _ = self
                    .term
                    .write_line(&format!("  {}", style(message).yellow()));
            } else {
                let _ = self.term.write_line(&format!("  {message}"));
            }
        }

        if self.verbose {
            let _ = self
                .term
                .write_line(&format!("  Site id:    {}", created.site.site_id));
            let _ = self
                .term
                .write_line(&format!("  Duration:   {:?}", report.duration));
        }

        Ok(())
    }

    fn format_reaped(&self, count: usize) -> Result<()> {
        if !self.quiet {
            self.success_line(&format!("Deleted {count} expired site(s)"));
        }
        Ok(())
    }

    fn format_deleted(&self, site_id: &str, existed: bool) -> Result<()> {
        if self.quiet {
            return Ok(());
        }
        if existed {
            self.success_line(&format!("Deleted site {site_id}"));
        } else if self.use_colors {
            let _ = self.term.write_line(&format!(
                "{} No site {site_id}",
                style("WARNING:").yellow().bold()
            ));
        } else {
            let _ = self.term.write_line(&format!("WARNING: No site {site_id}"));
        }
        Ok(())
    }

    fn format_listening(&self, addr: SocketAddr) -> Result<()> {
        if !self.quiet {
            self.success_line(&format!("Listening on http://{addr}"));
        }
        Ok(())
    }

    fn format_error(&self, _operation: &str, error: &anyhow::Error) {
        // Always show errors, even in quiet mode
        let term = Term::stderr();
        if self.use_colors {
            let _ = term.write_line(&format!("{} {error:?}", style("ERROR:").red().bold()));
        } else {
            let _ = term.write_line(&format!("ERROR: {error:?}"));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(HumanFormatter::format_size(512), "512 B");
        assert_eq!(HumanFormatter::format_size(2048), "2.0 KB");
        assert_eq!(HumanFormatter::format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
