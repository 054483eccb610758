//! Tracing subscriber setup.

use tracing_subscriber::{filter::ParseError, fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Build the log filter. `RUST_LOG` wins over the configured level.
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter, ParseError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.level),
    }
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let filter = env_filter(config)?;
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}
