//! Process-wide tracing setup.

use std::io;
use std::sync::OnceLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::Layer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::cli::LogFormat;

static INIT_GUARD: OnceLock<()> = OnceLock::new();

/// Environment variables consulted for a filter, in priority order.
const FILTER_VARS: [&str; 3] = ["TMPWEB_LOG", "LOGLEVEL", "RUST_LOG"];

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to parse log filter: {0}")]
    FilterParse(#[from] tracing_subscriber::filter::ParseError),
    #[error("logging already initialized")]
    AlreadyInitialized,
    #[error("failed to initialize subscriber: {0}")]
    TryInit(#[from] tracing_subscriber::util::TryInitError),
}

/// Builds the filter from the environment, or `default_level`.
///
/// `LOGLEVEL` may hold a bare level name in any case (`DEBUG`).
fn build_env_filter(default_level: &str) -> Result<EnvFilter, LoggingError> {
    for var in FILTER_VARS {
        if let Ok(filter) = std::env::var(var)
            && !filter.trim().is_empty()
        {
            return Ok(EnvFilter::try_new(filter.trim().to_ascii_lowercase())?);
        }
    }
    Ok(EnvFilter::try_new(default_level)?)
}

/// Installs the global subscriber. Log lines go to stderr so stdout stays
/// free for command results.
pub fn init_logging(format: LogFormat, default_level: &str) -> Result<(), LoggingError> {
    if INIT_GUARD.set(()).is_err() {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = build_env_filter(default_level)?;
    let layer = match format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
        LogFormat::Text => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .with_filter(filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    Ok(())
}
