//! # devqueue Core
//!
//! Core traits and types for managing device execution queues.
//!
//! A [`QueueManager`] discovers compute devices through a [`DeviceRuntime`],
//! lazily builds one [`Queue`] per device, and keeps a per-thread stack of
//! activated queues so code can establish a *current queue* that nested calls
//! override and restore.
//!
//! ## Core Abstractions
//!
//! - [`DeviceRuntime`] - Boundary to the native compute stack
//! - [`DeviceCatalog`] - One-shot, read-only platform and device index
//! - [`QueueRegistry`] - Lazily populated queue cache keyed by device
//! - [`ActiveQueueStack`] - Per-thread LIFO of activated queues
//! - [`QueueManager`] - Facade combining the above
//!
//! ## Example
//!
//! ```ignore
//! use devqueue_core::prelude::*;
//!
//! let manager = QueueManager::new(runtime, ManagerConfig::default())?;
//! let _gpu = manager.activate(DeviceClass::Gpu, 0)?;
//! assert_eq!(manager.activated_count(), 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod catalog;
pub mod config;
pub mod device;
pub mod dump;
pub mod error;
pub mod manager;
pub mod queue;
pub mod registry;
pub mod runtime;
pub mod stack;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::catalog::DeviceCatalog;
    pub use crate::config::{
        DeviceSelector, EmptyStackPolicy, ManagerConfig, ManagerConfigBuilder,
    };
    pub use crate::device::{DeviceClass, DeviceInfo, PlatformInfo};
    pub use crate::error::{DevQueueError, Result};
    pub use crate::manager::{ActiveQueueGuard, QueueManager, QueueManagerBuilder};
    pub use crate::queue::{Context, Queue, QueueId, QueueKey};
    pub use crate::registry::QueueRegistry;
    pub use crate::runtime::{DeviceRuntime, NativeQueue, StaticRuntime};
    pub use crate::stack::ActiveQueueStack;
}

// Re-exports for convenience
pub use catalog::DeviceCatalog;
pub use config::{EmptyStackPolicy, ManagerConfig};
pub use device::{DeviceClass, DeviceInfo, PlatformInfo};
pub use error::{DevQueueError, Result};
pub use manager::{ActiveQueueGuard, QueueManager};
pub use queue::{Context, Queue, QueueKey};
pub use registry::QueueRegistry;
pub use runtime::{DeviceRuntime, NativeQueue, StaticRuntime};
pub use stack::ActiveQueueStack;
