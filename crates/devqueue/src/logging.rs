//! Tracing subscriber setup.

use devqueue_core::error::{DevQueueError, Result};

use crate::settings::{LogFormat, LoggingConfig};

/// Install a global `tracing` subscriber described by `config`.
///
/// `RUST_LOG` overrides the configured level. Fails with
/// [`DevQueueError::AlreadyInitialized`] when a subscriber is already set.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = config.env_filter()?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target)
        .with_ansi(config.ansi);

    let installed = match config.format {
        LogFormat::Full => builder.try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|_| DevQueueError::AlreadyInitialized)
}
