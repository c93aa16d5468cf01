//! Queue manager configuration.

use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;
use crate::error::{DevQueueError, Result};

/// What `current()` does when the calling thread activated nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyStackPolicy {
    /// Return the manager-wide default queue, materialized on first use.
    #[default]
    DefaultQueue,
    /// Fail with `NoCurrentQueue`.
    Error,
}

/// A device chosen by class and ordinal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSelector {
    /// Device class.
    pub class: DeviceClass,
    /// Device ordinal.
    #[serde(default)]
    pub index: usize,
}

impl DeviceSelector {
    /// Create a selector.
    pub const fn new(class: DeviceClass, index: usize) -> Self {
        Self { class, index }
    }
}

impl Default for DeviceSelector {
    fn default() -> Self {
        Self::new(DeviceClass::Cpu, 0)
    }
}

/// Configuration of a [`QueueManager`](crate::manager::QueueManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Behavior of `current()` on an empty stack.
    #[serde(default)]
    pub empty_stack_policy: EmptyStackPolicy,

    /// Preferred device for the default queue.
    #[serde(default)]
    pub default_device: DeviceSelector,

    /// Classes tried, in order, when the preferred default device is absent.
    /// The first device (ordinal 0) of the first class present is used.
    #[serde(default = "default_fallback_order")]
    pub default_fallback_order: Vec<DeviceClass>,
}

fn default_fallback_order() -> Vec<DeviceClass> {
    DeviceClass::ALL.to_vec()
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            empty_stack_policy: EmptyStackPolicy::default(),
            default_device: DeviceSelector::default(),
            default_fallback_order: default_fallback_order(),
        }
    }
}

impl ManagerConfig {
    /// Configuration where `current()` on an empty stack is an error.
    pub fn strict() -> Self {
        Self {
            empty_stack_policy: EmptyStackPolicy::Error,
            ..Self::default()
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.empty_stack_policy == EmptyStackPolicy::DefaultQueue
            && self.default_fallback_order.is_empty()
        {
            return Err(DevQueueError::InvalidConfig(
                "default_fallback_order must not be empty when the default queue is enabled"
                    .to_string(),
            ));
        }
        Ok(())
    }
}

/// Builder for [`ManagerConfig`].
#[derive(Debug, Default)]
pub struct ManagerConfigBuilder {
    config: ManagerConfig,
}

impl ManagerConfigBuilder {
    /// Start from defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the empty-stack policy.
    pub fn empty_stack_policy(mut self, policy: EmptyStackPolicy) -> Self {
        self.config.empty_stack_policy = policy;
        self
    }

    /// Set the preferred default device.
    pub fn default_device(mut self, class: DeviceClass, index: usize) -> Self {
        self.config.default_device = DeviceSelector::new(class, index);
        self
    }

    /// Set the fallback order for the default queue.
    pub fn default_fallback_order(mut self, order: Vec<DeviceClass>) -> Self {
        self.config.default_fallback_order = order;
        self
    }

    /// Validate and build.
    pub fn build(self) -> Result<ManagerConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
