//! Tracing subscriber setup

use tracing_subscriber::EnvFilter;

use facelens_core::{FacelensError, FacelensResult};

use crate::{LogFormat, RuntimeConfig};

/// Install the global subscriber. `RUST_LOG` wins over `default_filter`.
///
/// Fails if a global subscriber is already set.
pub fn init(format: LogFormat, default_filter: &str) -> FacelensResult<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| FacelensError::Config(format!("invalid log filter: {e}")))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    let installed = match format {
        LogFormat::Pretty => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|e| FacelensError::Config(format!("tracing subscriber: {e}")))
}

pub fn init_from_config(config: &RuntimeConfig) -> FacelensResult<()> {
    init(config.log_format, &config.log_filter)
}
