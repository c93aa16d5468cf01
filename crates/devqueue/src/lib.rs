//! # devqueue
//!
//! Per-thread *current device queue* management.
//!
//! A [`QueueManager`] discovers the platforms and devices of a
//! [`DeviceRuntime`] once, builds one [`Queue`] per device on first request,
//! and keeps a stack of activated queues for every thread. Code selects a
//! device by pushing its queue and restores the previous selection by popping
//! it; nested library calls observe the innermost selection through
//! [`QueueManager::current_queue`].
//!
//! ## Quick Start
//!
//! ```ignore
//! use devqueue::prelude::*;
//!
//! let config = ConfigBuilder::new().simulated_gpus(1).build()?;
//! let manager = config.build_manager()?;
//!
//! manager.push_queue(DeviceClass::Gpu, 0)?;
//! assert_eq!(manager.current_queue()?.class(), DeviceClass::Gpu);
//! manager.pop_queue()?;
//!
//! manager.with_queue(DeviceClass::Cpu, 0, |queue| queue.wait())??;
//! ```
//!
//! ## Process-wide manager
//!
//! [`global`] returns a manager shared by the whole process, created from
//! `DEVQUEUE__*` environment variables unless [`init_global`] ran first.
//! The C interface in `devqueue-ffi` operates on this instance.
//!
//! ## Runtimes
//!
//! - **Host** - the machine's CPU plus a host fallback device (always available)
//! - **Simulated** - GPUs and accelerators backed by the host, enabled through
//!   [`HostConfig`] for testing device-selection logic
//!
//! Other runtimes plug in by implementing [`DeviceRuntime`].

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(hidden_glob_reexports)]

// Re-export core types
pub use devqueue_core::*;

// Re-export the host runtime (always available)
pub use devqueue_host::{HostConfig, HostQueue, HostRuntime};

mod global;
mod logging;
pub mod settings;

pub use global::{global, init_global, try_global};
pub use logging::init_logging;
pub use settings::{
    load_config, load_config_from_str, ConfigBuilder, DevQueueConfig, LogFormat, LoggingConfig,
};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::settings::{ConfigBuilder, DevQueueConfig};
    pub use crate::{global, init_global, HostConfig, HostRuntime};
    pub use devqueue_core::prelude::*;
}
