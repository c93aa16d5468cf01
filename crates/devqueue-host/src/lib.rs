//! Host runtime for devqueue.
//!
//! [`HostRuntime`] exposes the machine's processor as a CPU device plus a
//! host fallback device, and can add simulated GPUs and accelerators for
//! testing device-targeting code on machines without them.

#![warn(missing_docs)]

mod config;
mod runtime;
mod system;

pub use config::HostConfig;
pub use runtime::{HostQueue, HostRuntime};
