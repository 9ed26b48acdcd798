//! Tracing subscriber setup for binaries and tests.

use crate::error::{IndexError, Result};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs a global `tracing` subscriber filtered by `level`
/// (any `EnvFilter` directive, e.g. `"info"` or `"sombra_compact=trace"`).
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_new(level)
                .map_err(|e| IndexError::Config(format!("invalid log level: {e}")))?,
        )
        .with_target(true)
        .with_thread_ids(true)
        .try_init()
        .map_err(|_| IndexError::Invalid("logging already initialized"))
}
