//! Queue manager facade.
//!
//! [`QueueManager`] ties the device catalog, the queue registry and the
//! per-thread active-queue stacks together. Catalog and registry are shared
//! by every thread using the manager; the stack is private to each thread.
//!
//! # Example
//!
//! ```ignore
//! use devqueue_core::prelude::*;
//!
//! let manager = QueueManager::builder().runtime(runtime).build()?;
//!
//! manager.push_queue(DeviceClass::Gpu, 0)?;
//! assert_eq!(manager.activated_count(), 1);
//! let q = manager.current_queue()?;
//! manager.pop_queue()?;
//!
//! // Scoped activation, popped when the guard drops.
//! let _guard = manager.activate(DeviceClass::Cpu, 0)?;
//! ```

use std::io::{self, Write};
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, error};

use crate::catalog::DeviceCatalog;
use crate::config::{EmptyStackPolicy, ManagerConfig};
use crate::device::{DeviceClass, DeviceInfo, PlatformInfo};
use crate::dump;
use crate::error::{DevQueueError, Result};
use crate::queue::Queue;
use crate::registry::QueueRegistry;
use crate::runtime::DeviceRuntime;
use crate::stack::{self, ActiveQueueStack, StackOwner};

/// Process-local manager of device queues and per-thread current queues.
pub struct QueueManager {
    owner: StackOwner,
    config: ManagerConfig,
    catalog: Arc<DeviceCatalog>,
    registry: Arc<QueueRegistry>,
    default_queue: OnceLock<Queue>,
    default_init: Mutex<()>,
}

impl QueueManager {
    /// Create a manager over `runtime`.
    pub fn new(runtime: Arc<dyn DeviceRuntime>, config: ManagerConfig) -> Result<Self> {
        Self::with_catalog(Arc::new(DeviceCatalog::new(runtime)), config)
    }

    /// Create a manager over an existing catalog.
    pub fn with_catalog(catalog: Arc<DeviceCatalog>, config: ManagerConfig) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(QueueRegistry::new(Arc::clone(&catalog)));
        Ok(Self {
            owner: StackOwner::next(),
            config,
            catalog,
            registry,
            default_queue: OnceLock::new(),
            default_init: Mutex::new(()),
        })
    }

    /// Create a builder.
    pub fn builder() -> QueueManagerBuilder {
        QueueManagerBuilder::new()
    }

    /// Configuration in use.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Device catalog.
    pub fn catalog(&self) -> &Arc<DeviceCatalog> {
        &self.catalog
    }

    /// Queue registry.
    pub fn registry(&self) -> &Arc<QueueRegistry> {
        &self.registry
    }

    // ------------------------------------------------------------------
    // Catalog queries
    // ------------------------------------------------------------------

    /// Number of discovered platforms.
    pub fn count_platforms(&self) -> usize {
        self.catalog.count_platforms()
    }

    /// Number of discovered devices of `class`.
    pub fn count_devices(&self, class: DeviceClass) -> usize {
        self.catalog.count_devices(class)
    }

    /// Number of CPU queues that can be requested.
    pub fn num_cpu_queues(&self) -> usize {
        self.count_devices(DeviceClass::Cpu)
    }

    /// Number of GPU queues that can be requested.
    pub fn num_gpu_queues(&self) -> usize {
        self.count_devices(DeviceClass::Gpu)
    }

    /// Number of queues of `class` built so far.
    pub fn cached_queue_count(&self, class: DeviceClass) -> usize {
        self.registry.cached_count(class)
    }

    /// All platforms.
    pub fn platforms(&self) -> &[PlatformInfo] {
        self.catalog.platforms()
    }

    // ------------------------------------------------------------------
    // Queues
    // ------------------------------------------------------------------

    /// Get the queue bound to device `index` of `class`.
    pub fn get_queue(&self, class: DeviceClass, index: usize) -> Result<Queue> {
        self.registry.get(class, index)
    }

    /// Release a caller-held queue handle.
    ///
    /// The handle is consumed. The registry keeps its own cached copy, so a
    /// later `get_queue` for the same device still succeeds.
    pub fn delete_queue(&self, queue: Queue) {
        debug!(
            queue_id = queue.id().as_u64(),
            key = %queue.key(),
            remaining = queue.handle_count() - 1,
            "Released queue handle"
        );
        drop(queue);
    }

    /// Manager-wide default queue, built on first use.
    ///
    /// Uses the configured default device when present, otherwise device 0 of
    /// the first class in the fallback order that has devices. Fails with
    /// [`DevQueueError::NoCurrentQueue`] when the catalog has no usable device.
    /// Once built, the default queue is returned without locking.
    pub fn default_queue(&self) -> Result<Queue> {
        if let Some(queue) = self.default_queue.get() {
            return Ok(queue.clone());
        }

        let _init = self.default_init.lock();
        if let Some(queue) = self.default_queue.get() {
            return Ok(queue.clone());
        }

        let preferred = self.config.default_device;
        let (class, index) = if preferred.index < self.count_devices(preferred.class) {
            (preferred.class, preferred.index)
        } else {
            let class = self
                .config
                .default_fallback_order
                .iter()
                .copied()
                .find(|&c| self.count_devices(c) > 0)
                .ok_or(DevQueueError::NoCurrentQueue)?;
            (class, 0)
        };

        let queue = self.registry.get(class, index)?;
        debug!(key = %queue.key(), "Materialized default queue");
        Ok(self.default_queue.get_or_init(|| queue).clone())
    }

    // ------------------------------------------------------------------
    // Active-queue stack
    // ------------------------------------------------------------------

    /// Activate the queue of device `index` of `class` on the calling thread.
    pub fn push_queue(&self, class: DeviceClass, index: usize) -> Result<Queue> {
        let queue = self.registry.get(class, index)?;
        let depth = stack::push(self.owner, queue.clone());
        debug!(key = %queue.key(), depth, "Pushed queue");
        Ok(queue)
    }

    /// Deactivate the calling thread's current queue.
    ///
    /// Fails with [`DevQueueError::EmptyStack`] when nothing is activated.
    pub fn pop_queue(&self) -> Result<()> {
        let queue = stack::pop(self.owner)?;
        debug!(
            key = %queue.key(),
            depth = stack::depth(self.owner),
            "Popped queue"
        );
        Ok(())
    }

    /// The calling thread's current queue.
    ///
    /// On an empty stack this follows [`EmptyStackPolicy`]: the default queue,
    /// or [`DevQueueError::NoCurrentQueue`].
    pub fn current_queue(&self) -> Result<Queue> {
        if let Some(queue) = stack::top(self.owner) {
            return Ok(queue);
        }
        match self.config.empty_stack_policy {
            EmptyStackPolicy::DefaultQueue => self.default_queue(),
            EmptyStackPolicy::Error => Err(DevQueueError::NoCurrentQueue),
        }
    }

    /// Number of queues activated on the calling thread.
    ///
    /// The default queue never counts.
    pub fn activated_count(&self) -> usize {
        stack::depth(self.owner)
    }

    /// Copy of the calling thread's active-queue stack.
    pub fn activated_queues(&self) -> ActiveQueueStack {
        stack::snapshot(self.owner)
    }

    /// Push a queue and return a guard that pops it when dropped.
    pub fn activate(&self, class: DeviceClass, index: usize) -> Result<ActiveQueueGuard<'_>> {
        let queue = self.push_queue(class, index)?;
        Ok(ActiveQueueGuard {
            manager: self,
            queue,
            depth: self.activated_count(),
            _not_send: PhantomData,
        })
    }

    /// Run `f` with device `index` of `class` as the current queue.
    pub fn with_queue<R>(
        &self,
        class: DeviceClass,
        index: usize,
        f: impl FnOnce(&Queue) -> R,
    ) -> Result<R> {
        let guard = self.activate(class, index)?;
        Ok(f(guard.queue()))
    }

    // ------------------------------------------------------------------
    // Diagnostics
    // ------------------------------------------------------------------

    /// Report of every platform and its devices.
    pub fn platform_info(&self) -> String {
        dump::platform_report(self.catalog.platforms())
    }

    /// Report of one device.
    pub fn device_info(&self, device: &DeviceInfo) -> String {
        dump::device_report(device)
    }

    /// Write the platform report to `writer`.
    pub fn write_platform_info<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.platform_info().as_bytes())
    }

    /// Print the platform report to stderr.
    pub fn dump_platform_info(&self) {
        let _ = self.write_platform_info(&mut io::stderr().lock());
    }

    /// Print a device report to stderr.
    pub fn dump_device_info(&self, device: &DeviceInfo) {
        let _ = io::stderr().lock().write_all(self.device_info(device).as_bytes());
    }
}

impl Drop for QueueManager {
    fn drop(&mut self) {
        stack::discard(self.owner);
    }
}

/// Builder for [`QueueManager`].
#[derive(Default)]
pub struct QueueManagerBuilder {
    runtime: Option<Arc<dyn DeviceRuntime>>,
    config: ManagerConfig,
}

impl QueueManagerBuilder {
    /// Create a builder with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the device runtime.
    pub fn runtime(mut self, runtime: Arc<dyn DeviceRuntime>) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Set the configuration.
    pub fn config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Set the empty-stack policy.
    pub fn empty_stack_policy(mut self, policy: EmptyStackPolicy) -> Self {
        self.config.empty_stack_policy = policy;
        self
    }

    /// Build the manager.
    pub fn build(self) -> Result<QueueManager> {
        let runtime = self.runtime.ok_or_else(|| {
            DevQueueError::BackendUnavailable("no device runtime configured".to_string())
        })?;
        QueueManager::new(runtime, self.config)
    }
}

/// Scoped activation returned by [`QueueManager::activate`].
///
/// On drop the stack is cut back to the depth it had before the guard was
/// created, removing the guarded queue and anything pushed above it. If the
/// guarded queue was already popped, nothing is removed. Bound to the thread
/// that created it.
#[must_use = "the queue is deactivated as soon as the guard is dropped"]
pub struct ActiveQueueGuard<'a> {
    manager: &'a QueueManager,
    queue: Queue,
    depth: usize,
    _not_send: PhantomData<*const ()>,
}

impl ActiveQueueGuard<'_> {
    /// The activated queue.
    pub fn queue(&self) -> &Queue {
        &self.queue
    }
}

impl Drop for ActiveQueueGuard<'_> {
    fn drop(&mut self) {
        let depth = self.manager.activated_count();
        if depth < self.depth {
            error!(
                key = %self.queue.key(),
                expected = self.depth,
                actual = depth,
                "Guarded queue was popped before guard release"
            );
            return;
        }
        if depth > self.depth {
            error!(
                key = %self.queue.key(),
                expected = self.depth,
                actual = depth,
                "Unbalanced queue stack at guard release"
            );
        }
        let removed = stack::truncate(self.manager.owner, self.depth - 1);
        debug!(key = %self.queue.key(), removed, depth = self.depth - 1, "Released queue guard");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::StaticRuntime;

    fn runtime() -> Arc<dyn DeviceRuntime> {
        Arc::new(StaticRuntime::new(
            "test",
            vec![PlatformInfo::new("Test", "test")
                .with_device(DeviceInfo::new(DeviceClass::Cpu, "cpu0"))
                .with_device(DeviceInfo::new(DeviceClass::Gpu, "gpu0"))
                .with_device(DeviceInfo::new(DeviceClass::Host, "host0"))],
        ))
    }

    fn manager() -> QueueManager {
        QueueManager::builder().runtime(runtime()).build().unwrap()
    }

    #[test]
    fn test_builder_requires_runtime() {
        assert!(matches!(
            QueueManager::builder().build(),
            Err(DevQueueError::BackendUnavailable(_))
        ));
    }

    #[test]
    fn test_push_pop_counts() {
        let m = manager();
        assert_eq!(m.activated_count(), 0);

        m.push_queue(DeviceClass::Cpu, 0).unwrap();
        m.push_queue(DeviceClass::Gpu, 0).unwrap();
        assert_eq!(m.activated_count(), 2);
        assert_eq!(m.current_queue().unwrap().class(), DeviceClass::Gpu);

        m.pop_queue().unwrap();
        assert_eq!(m.current_queue().unwrap().class(), DeviceClass::Cpu);
        m.pop_queue().unwrap();
        assert_eq!(m.activated_count(), 0);
        assert_eq!(m.pop_queue().unwrap_err(), DevQueueError::EmptyStack);
    }

    #[test]
    fn test_push_out_of_range_leaves_stack() {
        let m = manager();
        m.push_queue(DeviceClass::Cpu, 0).unwrap();
        assert!(matches!(
            m.push_queue(DeviceClass::Gpu, 1),
            Err(DevQueueError::OutOfRange { .. })
        ));
        assert_eq!(m.activated_count(), 1);
        m.pop_queue().unwrap();
    }

    #[test]
    fn test_default_queue_not_counted() {
        let m = manager();
        let q = m.current_queue().unwrap();
        assert_eq!(q.key().class, DeviceClass::Cpu);
        assert_eq!(m.activated_count(), 0);
        assert!(m.default_queue().unwrap().same_instance(&q));
    }

    #[test]
    fn test_push_pop_restores_current() {
        let m = manager();
        let before = m.current_queue().unwrap();
        m.push_queue(DeviceClass::Host, 0).unwrap();
        assert!(m.current_queue().unwrap().context().is_host());
        m.pop_queue().unwrap();
        assert_eq!(m.current_queue().unwrap(), before);
    }

    #[test]
    fn test_strict_policy() {
        let m = QueueManager::new(runtime(), ManagerConfig::strict()).unwrap();
        assert_eq!(m.current_queue().unwrap_err(), DevQueueError::NoCurrentQueue);
        m.push_queue(DeviceClass::Cpu, 0).unwrap();
        assert!(m.current_queue().is_ok());
        m.pop_queue().unwrap();
        assert_eq!(m.current_queue().unwrap_err(), DevQueueError::NoCurrentQueue);
    }

    #[test]
    fn test_default_fallback_order() {
        let config = crate::config::ManagerConfigBuilder::new()
            .default_device(DeviceClass::Accelerator, 0)
            .default_fallback_order(vec![DeviceClass::Host, DeviceClass::Cpu])
            .build()
            .unwrap();
        let m = QueueManager::new(runtime(), config).unwrap();
        assert_eq!(m.current_queue().unwrap().class(), DeviceClass::Host);
    }

    #[test]
    fn test_default_queue_on_empty_catalog() {
        let m = QueueManager::new(Arc::new(StaticRuntime::empty()), ManagerConfig::default())
            .unwrap();
        assert_eq!(m.count_platforms(), 0);
        assert_eq!(m.current_queue().unwrap_err(), DevQueueError::NoCurrentQueue);
        assert_eq!(m.platform_info(), "No platforms found.\n");
    }

    #[test]
    fn test_guard_pops_on_drop() {
        let m = manager();
        {
            let guard = m.activate(DeviceClass::Gpu, 0).unwrap();
            assert_eq!(guard.queue().class(), DeviceClass::Gpu);
            assert_eq!(m.activated_count(), 1);
        }
        assert_eq!(m.activated_count(), 0);

        let name = m
            .with_queue(DeviceClass::Cpu, 0, |q| {
                assert_eq!(m.activated_count(), 1);
                q.device().name.clone()
            })
            .unwrap();
        assert_eq!(name, "cpu0");
        assert_eq!(m.activated_count(), 0);
    }

    #[test]
    fn test_managers_do_not_share_stacks() {
        let a = manager();
        let b = manager();
        a.push_queue(DeviceClass::Cpu, 0).unwrap();
        assert_eq!(a.activated_count(), 1);
        assert_eq!(b.activated_count(), 0);
        assert_eq!(b.pop_queue().unwrap_err(), DevQueueError::EmptyStack);
        a.pop_queue().unwrap();
    }

    #[test]
    fn test_delete_queue_keeps_cache() {
        let m = manager();
        let q = m.get_queue(DeviceClass::Gpu, 0).unwrap();
        m.delete_queue(q);
        assert_eq!(m.cached_queue_count(DeviceClass::Gpu), 1);
        assert!(m.get_queue(DeviceClass::Gpu, 0).is_ok());
    }

    #[test]
    fn test_counts() {
        let m = manager();
        assert_eq!(m.count_platforms(), 1);
        assert_eq!(m.num_cpu_queues(), 1);
        assert_eq!(m.num_gpu_queues(), 1);
        assert_eq!(m.count_devices(DeviceClass::Accelerator), 0);
        assert_eq!(m.cached_queue_count(DeviceClass::Cpu), 0);
    }

    #[test]
    fn test_write_platform_info() {
        let m = manager();
        let mut buf = Vec::new();
        m.write_platform_info(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("---Platform 0"));
        m.dump_platform_info();
        m.dump_device_info(m.get_queue(DeviceClass::Cpu, 0).unwrap().device());
    }

    #[test]
    fn test_guard_drops_queues_pushed_inside_scope() {
        let m = manager();
        {
            let _guard = m.activate(DeviceClass::Gpu, 0).unwrap();
            m.push_queue(DeviceClass::Host, 0).unwrap();
            assert_eq!(m.activated_count(), 2);
        }
        assert_eq!(m.activated_count(), 0);
        assert_eq!(m.current_queue().unwrap().class(), DeviceClass::Cpu);
    }

    #[test]
    fn test_guard_keeps_outer_queue_after_early_pop() {
        let m = manager();
        m.push_queue(DeviceClass::Cpu, 0).unwrap();
        {
            let _guard = m.activate(DeviceClass::Gpu, 0).unwrap();
            m.pop_queue().unwrap();
            assert_eq!(m.activated_count(), 1);
        }
        assert_eq!(m.activated_count(), 1);
        assert_eq!(m.current_queue().unwrap().class(), DeviceClass::Cpu);
        m.pop_queue().unwrap();
    }

    #[test]
    fn test_default_queue_shared_across_threads() {
        let m = manager();
        let queues: Vec<Queue> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| m.current_queue().unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        for q in &queues {
            assert!(q.same_instance(&queues[0]));
        }
        assert_eq!(m.cached_queue_count(DeviceClass::Cpu), 1);
    }

    #[test]
    fn test_default_queue_read_does_not_lock() {
        let m = manager();
        let expected = m.current_queue().unwrap();

        let init = m.default_init.lock();
        let (tx, rx) = std::sync::mpsc::channel();
        std::thread::scope(|s| {
            let m = &m;
            s.spawn(move || {
                let _ = tx.send(m.current_queue());
            });
            let received = rx.recv_timeout(std::time::Duration::from_secs(1));
            drop(init);
            let queue = received.expect("current_queue blocked").unwrap();
            assert!(queue.same_instance(&expected));
        });
    }
}
