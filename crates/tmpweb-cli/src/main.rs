//! tmpweb - temporary static site hosting server and operator CLI.

mod cli;
mod commands;
mod error;
mod logging;
mod output;
mod server;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::Parser;
use tmpweb_core::SiteConfig;
use tmpweb_core::SiteLifecycle;
use tmpweb_core::SqliteRegistry;

use crate::cli::Cli;
use crate::cli::Commands;
use crate::output::OutputFormatter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };
    if let Err(e) = logging::init_logging(cli.log_format, default_level) {
        eprintln!("warning: {e}");
    }

    let formatter = output::create_formatter(cli.json, cli.verbose, cli.quiet);

    match run(&cli, &*formatter).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            formatter.format_error(operation_name(&cli.command), &e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, formatter: &dyn OutputFormatter) -> Result<()> {
    if let Commands::Completion { shell } = &cli.command {
        commands::completion::execute(*shell);
        return Ok(());
    }

    let config =
        SiteConfig::load(&cli.config).map_err(|e| error::convert_config_error(e, &cli.config))?;
    let registry = SqliteRegistry::open(&config.database_location)
        .await
        .map_err(|e| {
            anyhow::anyhow!(
                "Cannot open site registry '{}': {e}\n\
                 HINT: Check database_location in the config file.",
                config.database_location.display()
            )
        })?;
    let lifecycle = Arc::new(SiteLifecycle::new(Arc::new(config), registry));

    let result = match &cli.command {
        Commands::Serve(args) => {
            commands::serve::execute(args, Arc::clone(&lifecycle), formatter).await
        }
        Commands::Create(args) => commands::create::execute(args, &lifecycle, formatter).await,
        Commands::Reap => commands::reap::execute(&lifecycle, formatter).await,
        Commands::Delete(args) => commands::delete::execute(args, &lifecycle, formatter).await,
        Commands::Completion { .. } => Ok(()),
    };

    lifecycle.registry().close().await;
    result
}

fn operation_name(command: &Commands) -> &'static str {
    match command {
        Commands::Serve(_) => "serve",
        Commands::Create(_) => "create",
        Commands::Reap => "reap",
        Commands::Delete(_) => "delete",
        Commands::Completion { .. } => "completion",
    }
}
