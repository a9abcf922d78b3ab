//! Logging bootstrap.
//!
//! Library crates log through the `log` facade; binaries call [`init`] once to
//! route those records into a `tracing` subscriber.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Failure to install the global logger.
#[derive(Debug, Error)]
pub enum LoggerError {
    /// The filter directive could not be parsed.
    #[error("invalid log filter `{directive}`: {source}")]
    Filter {
        /// The rejected directive.
        directive: String,
        /// Parser error.
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },
    /// A `log` logger was already installed.
    #[error("log bridge already installed: {0}")]
    Bridge(#[from] log::SetLoggerError),
    /// A global `tracing` subscriber was already installed.
    #[error("tracing subscriber already installed: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `default_directive` when set.
pub fn init(default_directive: &str) -> Result<(), LoggerError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_directive).map_err(|source| LoggerError::Filter {
            directive: default_directive.to_owned(),
            source,
        })?,
    };

    tracing_log::LogTracer::init()?;

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true));
    tracing::subscriber::set_global_default(subscriber)?;

    log::debug!("Logger initialised with default directive `{default_directive}`");
    Ok(())
}
