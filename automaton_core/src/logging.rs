//! Tracing subscriber setup for binaries embedding the engine.

use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::error::{EngineError, Result};

/// Install a global `fmt` subscriber.
///
/// `RUST_LOG` wins when set; otherwise `config.level` is used. Fails if the
/// directive is invalid or a global subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .map_err(|e| EngineError::Config(e.to_string()))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| EngineError::Config(e.to_string()))
}
