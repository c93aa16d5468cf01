//! Configuration loading.
//!
//! [`DevQueueConfig`] composes the manager, host runtime and logging
//! sections. It is loaded with the `config` crate from a TOML file or string,
//! layered with `DEVQUEUE__*` environment variables.
//!
//! ```toml
//! [manager]
//! empty_stack_policy = "error"
//! default_device = { class = "gpu", index = 0 }
//!
//! [host]
//! simulated_gpus = 2
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! The same keys can be set from the environment, for example
//! `DEVQUEUE__HOST__SIMULATED_GPUS=2`.

use std::path::Path;
use std::sync::Arc;

use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

use devqueue_core::config::{EmptyStackPolicy, ManagerConfig};
use devqueue_core::device::DeviceClass;
use devqueue_core::error::{DevQueueError, Result};
use devqueue_core::manager::QueueManager;
use devqueue_host::{HostConfig, HostRuntime};

const ENV_PREFIX: &str = "DEVQUEUE";
const ENV_SEPARATOR: &str = "__";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DevQueueConfig {
    /// Queue manager configuration.
    #[serde(default)]
    pub manager: ManagerConfig,

    /// Host runtime configuration.
    #[serde(default)]
    pub host: HostConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line output with all fields.
    #[default]
    Full,
    /// Abbreviated single-line output.
    Compact,
    /// Multi-line, human-oriented output.
    Pretty,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset, e.g. `info` or
    /// `devqueue_core=debug`.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,

    /// Use ANSI colors.
    #[serde(default = "default_true")]
    pub ansi: bool,

    /// Include the event target (module path).
    #[serde(default)]
    pub with_target: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
            ansi: default_true(),
            with_target: false,
        }
    }
}

impl LoggingConfig {
    /// Build the filter for this configuration. `RUST_LOG` takes precedence.
    pub fn env_filter(&self) -> Result<EnvFilter> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        self.level_filter()
    }

    fn level_filter(&self) -> Result<EnvFilter> {
        EnvFilter::try_new(&self.level).map_err(|e| {
            DevQueueError::InvalidConfig(format!("invalid log level '{}': {}", self.level, e))
        })
    }
}

impl DevQueueConfig {
    /// Load configuration from a file, overridden by the environment.
    pub fn load<P: AsRef<Path>>(path: P) -> std::result::Result<Self, ConfigError> {
        let builder = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR));

        builder.build()?.try_deserialize()
    }

    /// Load configuration with fallback to defaults.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Create from environment variables only.
    pub fn from_env() -> std::result::Result<Self, ConfigError> {
        let builder =
            Config::builder().add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR));

        builder.build()?.try_deserialize()
    }

    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.manager.validate()?;
        self.logging.level_filter()?;
        Ok(())
    }

    /// Build a queue manager over a [`HostRuntime`] configured by this file.
    pub fn build_manager(&self) -> Result<QueueManager> {
        self.validate()?;
        let runtime = HostRuntime::with_config(self.host.clone());
        QueueManager::new(Arc::new(runtime), self.manager.clone())
    }
}

/// Load configuration from a TOML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DevQueueConfig> {
    DevQueueConfig::load(path).map_err(config_error)
}

/// Load configuration from a TOML string.
pub fn load_config_from_str(content: &str) -> Result<DevQueueConfig> {
    let builder = Config::builder()
        .add_source(File::from_str(content, FileFormat::Toml))
        .add_source(Environment::with_prefix(ENV_PREFIX).separator(ENV_SEPARATOR));

    builder
        .build()
        .and_then(Config::try_deserialize)
        .map_err(config_error)
}

pub(crate) fn config_error(e: ConfigError) -> DevQueueError {
    DevQueueError::InvalidConfig(e.to_string())
}

/// Builder for programmatic configuration.
#[derive(Debug, Default)]
pub struct ConfigBuilder {
    config: DevQueueConfig,
}

impl ConfigBuilder {
    /// Create a builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the empty-stack policy.
    pub fn empty_stack_policy(mut self, policy: EmptyStackPolicy) -> Self {
        self.config.manager.empty_stack_policy = policy;
        self
    }

    /// Set the preferred default device.
    pub fn default_device(mut self, class: DeviceClass, index: usize) -> Self {
        self.config.manager.default_device.class = class;
        self.config.manager.default_device.index = index;
        self
    }

    /// Set the number of simulated GPUs.
    pub fn simulated_gpus(mut self, count: usize) -> Self {
        self.config.host.simulated_gpus = count;
        self
    }

    /// Set the number of simulated accelerators.
    pub fn simulated_accelerators(mut self, count: usize) -> Self {
        self.config.host.simulated_accelerators = count;
        self
    }

    /// Expose or hide the host fallback device.
    pub fn host_device(mut self, expose: bool) -> Self {
        self.config.host.expose_host_device = expose;
        self
    }

    /// Set the log level directive.
    pub fn log_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<DevQueueConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
