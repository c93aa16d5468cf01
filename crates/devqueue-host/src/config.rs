//! Host runtime configuration.

use serde::{Deserialize, Serialize};

/// Configuration of the devices a [`HostRuntime`](crate::HostRuntime) exposes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Name of the host platform.
    #[serde(default = "default_platform_name")]
    pub platform_name: String,

    /// Expose the host fallback device next to the CPU device.
    #[serde(default = "default_true")]
    pub expose_host_device: bool,

    /// Number of simulated GPUs on the simulation platform.
    #[serde(default)]
    pub simulated_gpus: usize,

    /// Number of simulated accelerators on the simulation platform.
    #[serde(default)]
    pub simulated_accelerators: usize,

    /// Global memory reported for each simulated device, in MiB.
    #[serde(default = "default_simulated_memory_mib")]
    pub simulated_memory_mib: u64,
}

fn default_platform_name() -> String {
    "devqueue Host Platform".to_string()
}

fn default_true() -> bool {
    true
}

fn default_simulated_memory_mib() -> u64 {
    4096
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            platform_name: default_platform_name(),
            expose_host_device: default_true(),
            simulated_gpus: 0,
            simulated_accelerators: 0,
            simulated_memory_mib: default_simulated_memory_mib(),
        }
    }
}

impl HostConfig {
    /// Configuration with `gpus` simulated GPUs.
    pub fn with_simulated_gpus(mut self, gpus: usize) -> Self {
        self.simulated_gpus = gpus;
        self
    }

    /// Configuration with `accelerators` simulated accelerators.
    pub fn with_simulated_accelerators(mut self, accelerators: usize) -> Self {
        self.simulated_accelerators = accelerators;
        self
    }

    /// Enable or disable the host fallback device.
    pub fn with_host_device(mut self, expose: bool) -> Self {
        self.expose_host_device = expose;
        self
    }

    /// True when a simulation platform is needed.
    pub fn has_simulated_devices(&self) -> bool {
        self.simulated_gpus > 0 || self.simulated_accelerators > 0
    }
}
