//! Host runtime implementation.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, info};

use devqueue_core::device::{DeviceClass, DeviceInfo, PlatformInfo};
use devqueue_core::error::{DevQueueError, Result};
use devqueue_core::queue::QueueKey;
use devqueue_core::runtime::{DeviceRuntime, NativeQueue};

use crate::config::HostConfig;
use crate::system;

const MIB: u64 = 1024 * 1024;
const VENDOR: &str = "devqueue";
const SIM_PLATFORM: &str = "devqueue Simulation Platform";

/// Runtime backed by the host processor.
///
/// Always available. Discovers one platform with a CPU device (and the host
/// fallback device unless disabled), plus a second platform of simulated
/// devices when configured.
pub struct HostRuntime {
    config: HostConfig,
    /// Native queues built per key.
    created: RwLock<HashMap<QueueKey, usize>>,
}

impl HostRuntime {
    /// Create a runtime with default configuration.
    pub fn new() -> Self {
        Self::with_config(HostConfig::default())
    }

    /// Create a runtime with the given configuration.
    pub fn with_config(config: HostConfig) -> Self {
        info!(
            simulated_gpus = config.simulated_gpus,
            simulated_accelerators = config.simulated_accelerators,
            "Initializing host runtime"
        );
        Self {
            config,
            created: RwLock::new(HashMap::new()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Keys that had a native queue built, sorted.
    pub fn created_queues(&self) -> Vec<QueueKey> {
        let mut keys: Vec<QueueKey> = self.created.read().keys().copied().collect();
        keys.sort();
        keys
    }

    /// Number of native queues built for `key`. Rebuilds after a registry
    /// invalidation count again.
    pub fn queues_built(&self, key: QueueKey) -> usize {
        self.created.read().get(&key).copied().unwrap_or(0)
    }

    fn host_platform(&self) -> PlatformInfo {
        let units = system::compute_units();
        let memory = system::total_memory();
        let cpu_name = system::cpu_name().unwrap_or_else(|| "Host CPU".to_string());

        let mut platform = PlatformInfo::new(&self.config.platform_name, "host")
            .with_vendor(VENDOR)
            .with_version(env!("CARGO_PKG_VERSION"))
            .with_device(
                DeviceInfo::new(DeviceClass::Cpu, cpu_name)
                    .with_vendor(VENDOR)
                    .with_driver_version(env!("CARGO_PKG_VERSION"))
                    .with_compute_units(units)
                    .with_global_memory(memory),
            );

        if self.config.expose_host_device {
            platform = platform.with_device(
                DeviceInfo::new(DeviceClass::Host, "Host Device")
                    .with_vendor(VENDOR)
                    .with_driver_version(env!("CARGO_PKG_VERSION"))
                    .with_global_memory(memory),
            );
        }
        platform
    }

    fn simulation_platform(&self) -> PlatformInfo {
        let memory = self.config.simulated_memory_mib * MIB;
        let mut platform = PlatformInfo::new(SIM_PLATFORM, "simulated")
            .with_vendor(VENDOR)
            .with_version(env!("CARGO_PKG_VERSION"));

        for i in 0..self.config.simulated_gpus {
            platform = platform.with_device(
                DeviceInfo::new(DeviceClass::Gpu, format!("Simulated GPU {}", i))
                    .with_vendor(VENDOR)
                    .with_driver_version("sim")
                    .with_compute_units(64)
                    .with_global_memory(memory),
            );
        }
        for i in 0..self.config.simulated_accelerators {
            platform = platform.with_device(
                DeviceInfo::new(
                    DeviceClass::Accelerator,
                    format!("Simulated Accelerator {}", i),
                )
                .with_vendor(VENDOR)
                .with_driver_version("sim")
                .with_compute_units(16)
                .with_global_memory(memory),
            );
        }
        platform
    }
}

impl Default for HostRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceRuntime for HostRuntime {
    fn name(&self) -> &str {
        "host"
    }

    fn enumerate_platforms(&self) -> Result<Vec<PlatformInfo>> {
        let mut platforms = vec![self.host_platform()];
        if self.config.has_simulated_devices() {
            platforms.push(self.simulation_platform());
        }
        Ok(platforms)
    }

    fn create_queue(&self, device: &DeviceInfo) -> Result<Arc<dyn NativeQueue>> {
        if device.vendor != VENDOR {
            return Err(DevQueueError::InvalidHandle(format!(
                "device '{}' was not discovered by the host runtime",
                device.name
            )));
        }

        debug!(key = %device.key(), name = %device.name, "Creating host queue");
        *self.created.write().entry(device.key()).or_insert(0) += 1;
        Ok(Arc::new(HostQueue::new(device.key())))
    }
}

/// Native queue of the host runtime.
///
/// Work runs synchronously on the submitting thread, so `wait` only records
/// the synchronization point.
pub struct HostQueue {
    key: QueueKey,
    waits: AtomicU64,
}

impl HostQueue {
    fn new(key: QueueKey) -> Self {
        Self {
            key,
            waits: AtomicU64::new(0),
        }
    }

    /// Device key this queue is bound to.
    pub fn key(&self) -> QueueKey {
        self.key
    }

    /// Number of completed `wait` calls.
    pub fn waits(&self) -> u64 {
        self.waits.load(Ordering::Relaxed)
    }
}

impl NativeQueue for HostQueue {
    fn wait(&self) -> Result<()> {
        self.waits.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}
