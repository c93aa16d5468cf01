//! Device and platform descriptions.
//!
//! These are plain data records produced by a [`DeviceRuntime`](crate::runtime::DeviceRuntime)
//! and indexed by the [`DeviceCatalog`](crate::catalog::DeviceCatalog).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DevQueueError;

/// Class of a compute device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceClass {
    /// Multi-core host processor exposed as a compute device.
    Cpu,
    /// Discrete or integrated GPU.
    Gpu,
    /// Fixed-function or programmable accelerator (FPGA, NPU, ...).
    Accelerator,
    /// Host fallback device executing on the calling thread.
    Host,
}

impl DeviceClass {
    /// All device classes in discovery order.
    pub const ALL: [DeviceClass; 4] = [
        DeviceClass::Cpu,
        DeviceClass::Gpu,
        DeviceClass::Accelerator,
        DeviceClass::Host,
    ];

    /// Lowercase name used in configuration and diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cpu => "cpu",
            Self::Gpu => "gpu",
            Self::Accelerator => "accelerator",
            Self::Host => "host",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DeviceClass {
    type Err = DevQueueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Self::Cpu),
            "gpu" => Ok(Self::Gpu),
            "accelerator" | "acc" => Ok(Self::Accelerator),
            "host" => Ok(Self::Host),
            other => Err(DevQueueError::InvalidConfig(format!(
                "unknown device class '{}'",
                other
            ))),
        }
    }
}

/// Information about a compute device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    /// Device class.
    pub class: DeviceClass,
    /// Ordinal within the class, assigned by the catalog in discovery order.
    pub index: usize,
    /// Ordinal of the platform exposing this device.
    pub platform_index: usize,
    /// Device name.
    pub name: String,
    /// Vendor name.
    pub vendor: String,
    /// Driver version string.
    pub driver_version: String,
    /// Number of parallel compute units.
    pub max_compute_units: u32,
    /// Maximum work-group size.
    pub max_work_group_size: u32,
    /// Global memory in bytes.
    pub global_memory: u64,
}

impl DeviceInfo {
    /// Create a device description with default capabilities.
    pub fn new(class: DeviceClass, name: impl Into<String>) -> Self {
        Self {
            class,
            index: 0,
            platform_index: 0,
            name: name.into(),
            vendor: String::new(),
            driver_version: String::new(),
            max_compute_units: 1,
            max_work_group_size: 1024,
            global_memory: 0,
        }
    }

    /// Set the vendor name.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Set the driver version.
    pub fn with_driver_version(mut self, version: impl Into<String>) -> Self {
        self.driver_version = version.into();
        self
    }

    /// Set the compute unit count.
    pub fn with_compute_units(mut self, units: u32) -> Self {
        self.max_compute_units = units;
        self
    }

    /// Set the global memory size.
    pub fn with_global_memory(mut self, bytes: u64) -> Self {
        self.global_memory = bytes;
        self
    }

    /// Registry key of the queue bound to this device.
    pub fn key(&self) -> crate::queue::QueueKey {
        crate::queue::QueueKey::new(self.class, self.index)
    }
}

/// Information about a compute platform (one driver stack exposing devices).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlatformInfo {
    /// Platform ordinal.
    pub index: usize,
    /// Platform name.
    pub name: String,
    /// Vendor name.
    pub vendor: String,
    /// Platform version string.
    pub version: String,
    /// Backend name (e.g. "host", "opencl", "level_zero").
    pub backend: String,
    /// Devices exposed by this platform.
    pub devices: Vec<DeviceInfo>,
}

impl PlatformInfo {
    /// Create an empty platform description.
    pub fn new(name: impl Into<String>, backend: impl Into<String>) -> Self {
        Self {
            index: 0,
            name: name.into(),
            vendor: String::new(),
            version: String::new(),
            backend: backend.into(),
            devices: Vec::new(),
        }
    }

    /// Set the vendor name.
    pub fn with_vendor(mut self, vendor: impl Into<String>) -> Self {
        self.vendor = vendor.into();
        self
    }

    /// Set the version string.
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    /// Add a device.
    pub fn with_device(mut self, device: DeviceInfo) -> Self {
        self.devices.push(device);
        self
    }

    /// Number of devices of the given class on this platform.
    pub fn count_devices(&self, class: DeviceClass) -> usize {
        self.devices.iter().filter(|d| d.class == class).count()
    }
}
