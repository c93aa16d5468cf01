//! Device runtime collaborator traits.
//!
//! A [`DeviceRuntime`] is the boundary to the native compute stack. It
//! enumerates platforms once and builds native queues on request. Everything
//! behind it (contexts, kernels, memory) is opaque to the queue manager.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::device::{DeviceInfo, PlatformInfo};
use crate::error::Result;

/// Native queue object owned by the device runtime.
pub trait NativeQueue: Send + Sync {
    /// Block until all work submitted to this queue has completed.
    fn wait(&self) -> Result<()>;
}

/// Backend that discovers devices and creates queues for them.
pub trait DeviceRuntime: Send + Sync {
    /// Short runtime name used in diagnostics.
    fn name(&self) -> &str;

    /// Enumerate platforms and their devices.
    ///
    /// Called at most once per catalog. Device `index` fields are reassigned
    /// by the catalog, so implementations may leave them at zero.
    fn enumerate_platforms(&self) -> Result<Vec<PlatformInfo>>;

    /// Build a native queue bound to `device` and its implicit context.
    fn create_queue(&self, device: &DeviceInfo) -> Result<Arc<dyn NativeQueue>>;
}

/// Runtime serving a fixed, caller-supplied platform list.
///
/// Useful when discovery happens elsewhere (e.g. in a host-language binding)
/// and in tests. Queues created by it complete work immediately.
pub struct StaticRuntime {
    name: String,
    platforms: Vec<PlatformInfo>,
    queues_created: AtomicUsize,
}

impl StaticRuntime {
    /// Create a runtime exposing `platforms`.
    pub fn new(name: impl Into<String>, platforms: Vec<PlatformInfo>) -> Self {
        Self {
            name: name.into(),
            platforms,
            queues_created: AtomicUsize::new(0),
        }
    }

    /// Create a runtime with no platforms.
    pub fn empty() -> Self {
        Self::new("empty", Vec::new())
    }

    /// Number of native queues built so far.
    pub fn queues_created(&self) -> usize {
        self.queues_created.load(Ordering::Relaxed)
    }
}

struct ImmediateQueue;

impl NativeQueue for ImmediateQueue {
    fn wait(&self) -> Result<()> {
        Ok(())
    }
}

impl DeviceRuntime for StaticRuntime {
    fn name(&self) -> &str {
        &self.name
    }

    fn enumerate_platforms(&self) -> Result<Vec<PlatformInfo>> {
        Ok(self.platforms.clone())
    }

    fn create_queue(&self, _device: &DeviceInfo) -> Result<Arc<dyn NativeQueue>> {
        self.queues_created.fetch_add(1, Ordering::Relaxed);
        Ok(Arc::new(ImmediateQueue))
    }
}
