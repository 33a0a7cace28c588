//! Logging setup built on `tracing`.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::utils::error::{Error, Result};

/// Initialize the global tracing subscriber.
///
/// Honors `RUST_LOG` when set, defaulting to `info` otherwise.
pub fn init() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()
        .map_err(|e| Error::Config(format!("Failed to initialize logger: {e}")))?;

    Ok(())
}
