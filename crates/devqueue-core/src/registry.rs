//! Queue registry.
//!
//! Lazily builds and caches one [`Queue`] per `(class, index)` key. Lookups of
//! cached queues take only the read lock. A native queue is built under a
//! per-key build lock with no registry lock held, so concurrent first requests
//! for one key build a single queue and requests for other keys never wait.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use crate::catalog::DeviceCatalog;
use crate::device::DeviceClass;
use crate::error::{DevQueueError, Result};
use crate::queue::{Queue, QueueKey};

/// Cache of device queues backed by a [`DeviceCatalog`].
pub struct QueueRegistry {
    catalog: Arc<DeviceCatalog>,
    queues: RwLock<HashMap<QueueKey, Queue>>,
    building: Mutex<HashMap<QueueKey, Arc<Mutex<()>>>>,
}

impl QueueRegistry {
    /// Create an empty registry.
    pub fn new(catalog: Arc<DeviceCatalog>) -> Self {
        Self {
            catalog,
            queues: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
        }
    }

    /// The catalog queues are resolved against.
    pub fn catalog(&self) -> &Arc<DeviceCatalog> {
        &self.catalog
    }

    /// Get the queue for `class`/`index`, building it on first use.
    ///
    /// Fails with [`DevQueueError::OutOfRange`] when `index` is not below the
    /// number of discovered devices of `class`.
    pub fn get(&self, class: DeviceClass, index: usize) -> Result<Queue> {
        let key = QueueKey::new(class, index);

        if let Some(queue) = self.queues.read().get(&key) {
            return Ok(queue.clone());
        }

        let device = self
            .catalog
            .device(class, index)
            .ok_or_else(|| DevQueueError::OutOfRange {
                class,
                index,
                available: self.catalog.count_devices(class),
            })?;

        let slot = Arc::clone(self.building.lock().entry(key).or_default());
        let _build = slot.lock();
        if let Some(queue) = self.queues.read().get(&key) {
            return Ok(queue.clone());
        }

        let native = self
            .catalog
            .runtime()
            .create_queue(device)
            .map_err(|e| DevQueueError::QueueCreation {
                class,
                index,
                reason: e.to_string(),
            })?;

        let queue = Queue::new(device.clone(), native);
        debug!(
            key = %key,
            queue_id = queue.id().as_u64(),
            device = %device.name,
            "Created device queue"
        );
        self.queues.write().insert(key, queue.clone());
        Ok(queue)
    }

    /// Whether a queue for `key` is cached.
    pub fn is_cached(&self, key: QueueKey) -> bool {
        self.queues.read().contains_key(&key)
    }

    /// Number of cached queues of `class`.
    pub fn cached_count(&self, class: DeviceClass) -> usize {
        self.queues.read().keys().filter(|k| k.class == class).count()
    }

    /// Total number of cached queues.
    pub fn len(&self) -> usize {
        self.queues.read().len()
    }

    /// True when no queue has been built yet.
    pub fn is_empty(&self) -> bool {
        self.queues.read().is_empty()
    }

    /// Drop the cached queue for `key`, returning it.
    ///
    /// Handles already given out stay valid; the next [`get`](Self::get)
    /// builds a fresh queue.
    pub fn invalidate(&self, key: QueueKey) -> Option<Queue> {
        let removed = self.queues.write().remove(&key);
        if removed.is_some() {
            debug!(key = %key, "Invalidated cached queue");
        }
        removed
    }

    /// Drop every cached queue.
    pub fn clear(&self) {
        self.queues.write().clear();
    }
}
