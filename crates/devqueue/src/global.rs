//! Process-wide queue manager.
//!
//! Flat entry points such as the C interface need a manager without threading
//! one through every call. The instance is created once, either explicitly
//! with [`init_global`] or on first use by [`global`] from the `DEVQUEUE__*`
//! environment, and lives for the rest of the process.

use std::sync::OnceLock;

use tracing::info;

use devqueue_core::error::{DevQueueError, Result};
use devqueue_core::manager::QueueManager;

use crate::settings::{config_error, DevQueueConfig};

static GLOBAL: OnceLock<QueueManager> = OnceLock::new();

/// Initialize the process-wide manager from `config`.
///
/// Fails with [`DevQueueError::AlreadyInitialized`] when the manager already
/// exists, including when an earlier [`global`] call created it.
pub fn init_global(config: &DevQueueConfig) -> Result<&'static QueueManager> {
    if GLOBAL.get().is_some() {
        return Err(DevQueueError::AlreadyInitialized);
    }
    let manager = config.build_manager()?;
    GLOBAL
        .set(manager)
        .map_err(|_| DevQueueError::AlreadyInitialized)?;
    info!(
        simulated_gpus = config.host.simulated_gpus,
        simulated_accelerators = config.host.simulated_accelerators,
        "Initialized global queue manager"
    );
    installed()
}

/// The process-wide manager, created from the environment on first use.
pub fn global() -> Result<&'static QueueManager> {
    if let Some(manager) = GLOBAL.get() {
        return Ok(manager);
    }
    let config = DevQueueConfig::from_env().map_err(config_error)?;
    let manager = config.build_manager()?;
    if GLOBAL.set(manager).is_ok() {
        info!("Initialized global queue manager from environment");
    }
    installed()
}

/// The process-wide manager, if it was created.
pub fn try_global() -> Option<&'static QueueManager> {
    GLOBAL.get()
}

fn installed() -> Result<&'static QueueManager> {
    GLOBAL
        .get()
        .ok_or_else(|| DevQueueError::BackendUnavailable("global manager not installed".into()))
}
