//! CLI argument parsing using clap.

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use clap_complete::Shell;
use std::net::SocketAddr;
use std::path::PathBuf;
use tmpweb_core::ArchiveKind;

#[derive(Parser)]
#[command(name = "tmpweb")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to the configuration file
    #[arg(short, long, global = true, default_value = "config.toml")]
    pub config: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Output results in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP server
    Serve(ServeArgs),
    /// Publish a local archive or HTML file as a site
    Create(CreateArgs),
    /// Delete every expired site
    Reap,
    /// Delete specific sites now, regardless of expiry
    Delete(DeleteArgs),
    /// Generate shell completions
    Completion {
        /// Target shell
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,
}

#[derive(clap::Args)]
pub struct CreateArgs {
    /// Archive (zip, tar, tar.gz) or HTML file to publish
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Days the site stays up (capped by max_retention)
    #[arg(short, long)]
    pub retention_days: Option<u64>,

    /// Treat the file as this type instead of sniffing it
    #[arg(short, long, value_parser = parse_archive_kind)]
    pub archive_type: Option<ArchiveKind>,
}

#[derive(clap::Args)]
pub struct DeleteArgs {
    /// Identifiers of the sites to delete
    #[arg(value_name = "SITE_ID", required = true)]
    pub site_ids: Vec<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines
    Text,
    /// One JSON object per line
    Json,
}

fn parse_archive_kind(s: &str) -> Result<ArchiveKind, String> {
    s.parse()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_archive_kind() {
        assert_eq!(parse_archive_kind("tar").unwrap(), ArchiveKind::Tar);
        assert!(parse_archive_kind("rar").is_err());
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tmpweb", "reap", "--config", "/etc/tmpweb.toml", "--json"])
            .unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/tmpweb.toml"));
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Reap));
    }

    #[test]
    fn test_create_args() {
        let cli = Cli::try_parse_from([
            "tmpweb",
            "create",
            "site.zip",
            "--retention-days",
            "3",
            "--archive-type",
            "zip",
        ])
        .unwrap();
        let Commands::Create(args) = cli.command else {
            panic!("expected create");
        };
        assert_eq!(args.retention_days, Some(3));
        assert_eq!(args.archive_type, Some(ArchiveKind::Zip));
    }
}
