//! Error types for devqueue.

use thiserror::Error;

use crate::device::DeviceClass;

/// Result type alias for devqueue operations.
pub type Result<T> = std::result::Result<T, DevQueueError>;

/// Errors raised by the catalog, the queue registry and the active-queue stack.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DevQueueError {
    /// Device index is not below the number of discovered devices of its class.
    #[error("{class} device {index} out of range ({available} available)")]
    OutOfRange {
        /// Requested device class.
        class: DeviceClass,
        /// Requested ordinal.
        index: usize,
        /// Number of devices of that class in the catalog.
        available: usize,
    },

    /// Pop on a thread whose active-queue stack is empty.
    #[error("active queue stack is empty")]
    EmptyStack,

    /// No queue was activated on this thread and no default queue is usable.
    #[error("no current queue on this thread")]
    NoCurrentQueue,

    /// Operation on a deleted or foreign handle.
    #[error("invalid handle: {0}")]
    InvalidHandle(String),

    /// The device runtime failed to build a queue for a device.
    #[error("failed to create queue for {class} device {index}: {reason}")]
    QueueCreation {
        /// Device class of the queue.
        class: DeviceClass,
        /// Device ordinal.
        index: usize,
        /// Runtime-provided reason.
        reason: String,
    },

    /// Generic device runtime error.
    #[error("backend error: {0}")]
    BackendError(String),

    /// The device runtime is not usable in this process.
    #[error("backend unavailable: {0}")]
    BackendUnavailable(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// A process-wide instance was already installed.
    #[error("queue manager already initialized")]
    AlreadyInitialized,
}

impl DevQueueError {
    /// Returns true for errors caused by a push/pop imbalance on the calling thread.
    pub fn is_stack_misuse(&self) -> bool {
        matches!(self, Self::EmptyStack | Self::NoCurrentQueue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_out_of_range_message() {
        let err = DevQueueError::OutOfRange {
            class: DeviceClass::Gpu,
            index: 3,
            available: 1,
        };
        assert_eq!(err.to_string(), "gpu device 3 out of range (1 available)");
    }

    #[test]
    fn test_stack_misuse() {
        assert!(DevQueueError::EmptyStack.is_stack_misuse());
        assert!(DevQueueError::NoCurrentQueue.is_stack_misuse());
        assert!(!DevQueueError::BackendError("x".into()).is_stack_misuse());
    }
}
