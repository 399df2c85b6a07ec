//! Tracing subscriber setup.

use crate::{CliError, CliResult};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Maps a `-v` count to the default log level.
///
/// No flag logs warnings and errors, every `-v` adds one level up to `TRACE`.
pub const fn verbosity_level(verbosity: u8) -> LevelFilter {
    match verbosity {
        0 => LevelFilter::WARN,
        1 => LevelFilter::INFO,
        2 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

/// Installs the global `fmt` subscriber.
///
/// Without an explicit `filter`, directives come from `RUST_LOG` on top of the level derived from
/// `verbosity`.
pub fn init_tracing_subscriber(verbosity: u8, filter: Option<EnvFilter>) -> CliResult<()> {
    let filter = filter.map_or_else(
        || {
            EnvFilter::builder()
                .with_default_directive(verbosity_level(verbosity).into())
                .from_env()
        },
        Ok,
    )?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| CliError::TracingInitialization(err.to_string()))
}
