//! Queue handles.
//!
//! A [`Queue`] is a cheap, cloneable handle to a native queue bound to one
//! device and its implicit [`Context`]. The registry holds one handle per
//! [`QueueKey`]; stacks and callers hold clones. Dropping a clone releases
//! only that reference.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::device::{DeviceClass, DeviceInfo};
use crate::error::Result;
use crate::runtime::NativeQueue;

/// Registry key: device class plus ordinal within that class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueKey {
    /// Device class.
    pub class: DeviceClass,
    /// Device ordinal.
    pub index: usize,
}

impl QueueKey {
    /// Create a key.
    pub const fn new(class: DeviceClass, index: usize) -> Self {
        Self { class, index }
    }
}

impl fmt::Display for QueueKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.class, self.index)
    }
}

/// Process-unique queue identifier, assigned at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueueId(u64);

impl QueueId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value.
    pub fn as_u64(self) -> u64 {
        self.0
    }
}

/// Implicit context a queue executes in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Context {
    device: DeviceInfo,
}

impl Context {
    /// Create the context of `device`.
    pub fn new(device: DeviceInfo) -> Self {
        Self { device }
    }

    /// Device this context was created for.
    pub fn device(&self) -> &DeviceInfo {
        &self.device
    }

    /// True for contexts of the host fallback device.
    pub fn is_host(&self) -> bool {
        self.device.class == DeviceClass::Host
    }
}

struct QueueInner {
    id: QueueId,
    key: QueueKey,
    context: Context,
    native: Arc<dyn NativeQueue>,
}

/// Handle to a device queue.
#[derive(Clone)]
pub struct Queue {
    inner: Arc<QueueInner>,
}

impl Queue {
    /// Wrap a native queue built for `device`.
    pub fn new(device: DeviceInfo, native: Arc<dyn NativeQueue>) -> Self {
        Self {
            inner: Arc::new(QueueInner {
                id: QueueId::next(),
                key: device.key(),
                context: Context::new(device),
                native,
            }),
        }
    }

    /// Queue identifier.
    pub fn id(&self) -> QueueId {
        self.inner.id
    }

    /// Registry key.
    pub fn key(&self) -> QueueKey {
        self.inner.key
    }

    /// Device class.
    pub fn class(&self) -> DeviceClass {
        self.inner.key.class
    }

    /// Device the queue is bound to.
    pub fn device(&self) -> &DeviceInfo {
        self.inner.context.device()
    }

    /// Implicit context.
    pub fn context(&self) -> &Context {
        &self.inner.context
    }

    /// Block until submitted work completes.
    pub fn wait(&self) -> Result<()> {
        self.inner.native.wait()
    }

    /// The native queue.
    pub fn native(&self) -> &Arc<dyn NativeQueue> {
        &self.inner.native
    }

    /// True when both handles refer to the same cached queue object.
    pub fn same_instance(&self, other: &Queue) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Number of live handles to this queue object.
    pub fn handle_count(&self) -> usize {
        Arc::strong_count(&self.inner)
    }
}

impl PartialEq for Queue {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key && self.device() == other.device()
    }
}

impl Eq for Queue {}

impl fmt::Debug for Queue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("id", &self.inner.id)
            .field("key", &self.inner.key)
            .field("device", &self.device().name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::{DeviceRuntime, StaticRuntime};

    fn make_queue(class: DeviceClass, index: usize) -> Queue {
        let mut device = DeviceInfo::new(class, format!("{}{}", class, index));
        device.index = index;
        let native = StaticRuntime::empty().create_queue(&device).unwrap();
        Queue::new(device, native)
    }

    #[test]
    fn test_value_equality_without_identity() {
        let a = make_queue(DeviceClass::Gpu, 0);
        let b = make_queue(DeviceClass::Gpu, 0);
        let c = make_queue(DeviceClass::Gpu, 1);

        assert_eq!(a, b);
        assert!(!a.same_instance(&b));
        assert_ne!(a.id(), b.id());
        assert_ne!(a, c);
        assert!(a.clone().same_instance(&a));
    }

    #[test]
    fn test_context_host_flag() {
        assert!(make_queue(DeviceClass::Host, 0).context().is_host());
        assert!(!make_queue(DeviceClass::Cpu, 0).context().is_host());
    }

    #[test]
    fn test_key_display() {
        assert_eq!(QueueKey::new(DeviceClass::Accelerator, 2).to_string(), "accelerator:2");
    }

    #[test]
    fn test_handle_count() {
        let q = make_queue(DeviceClass::Cpu, 0);
        assert_eq!(q.handle_count(), 1);
        let q2 = q.clone();
        assert_eq!(q.handle_count(), 2);
        drop(q2);
        assert_eq!(q.handle_count(), 1);
        assert!(q.wait().is_ok());
    }
}
