//! Device catalog.
//!
//! The catalog asks its [`DeviceRuntime`] for platforms exactly once, on the
//! first query, and serves every later query from the cached snapshot. Device
//! ordinals are assigned per class in discovery order across all platforms.

use std::sync::{Arc, OnceLock};

use tracing::{info, warn};

use crate::device::{DeviceClass, DeviceInfo, PlatformInfo};
use crate::runtime::DeviceRuntime;

/// Snapshot produced by the one-shot enumeration.
struct CatalogSnapshot {
    platforms: Vec<PlatformInfo>,
    /// Devices per class, indexed by `DeviceClass as usize`.
    by_class: [Vec<DeviceInfo>; 4],
    error: Option<String>,
}

/// Read-only, lazily populated index of platforms and devices.
pub struct DeviceCatalog {
    runtime: Arc<dyn DeviceRuntime>,
    snapshot: OnceLock<CatalogSnapshot>,
}

impl DeviceCatalog {
    /// Create a catalog backed by `runtime`. Nothing is enumerated yet.
    pub fn new(runtime: Arc<dyn DeviceRuntime>) -> Self {
        Self {
            runtime,
            snapshot: OnceLock::new(),
        }
    }

    /// The runtime backing this catalog.
    pub fn runtime(&self) -> &Arc<dyn DeviceRuntime> {
        &self.runtime
    }

    /// Name of the backing runtime.
    pub fn runtime_name(&self) -> &str {
        self.runtime.name()
    }

    /// Whether enumeration already ran.
    pub fn is_populated(&self) -> bool {
        self.snapshot.get().is_some()
    }

    fn snapshot(&self) -> &CatalogSnapshot {
        self.snapshot.get_or_init(|| populate(self.runtime.as_ref()))
    }

    /// Number of discovered platforms.
    pub fn count_platforms(&self) -> usize {
        self.snapshot().platforms.len()
    }

    /// Number of discovered devices of `class`.
    pub fn count_devices(&self, class: DeviceClass) -> usize {
        self.snapshot().by_class[class as usize].len()
    }

    /// All platforms in discovery order.
    pub fn platforms(&self) -> &[PlatformInfo] {
        &self.snapshot().platforms
    }

    /// Platform by ordinal.
    pub fn platform(&self, index: usize) -> Option<&PlatformInfo> {
        self.snapshot().platforms.get(index)
    }

    /// Device by class and ordinal.
    pub fn device(&self, class: DeviceClass, index: usize) -> Option<&DeviceInfo> {
        self.snapshot().by_class[class as usize].get(index)
    }

    /// Devices of `class` in ordinal order.
    pub fn devices(&self, class: DeviceClass) -> &[DeviceInfo] {
        &self.snapshot().by_class[class as usize]
    }

    /// Every device, grouped by class in [`DeviceClass::ALL`] order.
    pub fn all_devices(&self) -> impl Iterator<Item = &DeviceInfo> {
        self.snapshot().by_class.iter().flatten()
    }

    /// Error reported by the runtime during enumeration, if any.
    pub fn enumeration_error(&self) -> Option<&str> {
        self.snapshot().error.as_deref()
    }
}

fn populate(runtime: &dyn DeviceRuntime) -> CatalogSnapshot {
    let (mut platforms, error) = match runtime.enumerate_platforms() {
        Ok(platforms) => (platforms, None),
        Err(e) => {
            warn!(runtime = runtime.name(), error = %e, "Device enumeration failed");
            (Vec::new(), Some(e.to_string()))
        }
    };

    let mut by_class: [Vec<DeviceInfo>; 4] = Default::default();
    for (platform_index, platform) in platforms.iter_mut().enumerate() {
        platform.index = platform_index;
        for device in &mut platform.devices {
            let slot = &mut by_class[device.class as usize];
            device.index = slot.len();
            device.platform_index = platform_index;
            slot.push(device.clone());
        }
    }

    info!(
        runtime = runtime.name(),
        platforms = platforms.len(),
        cpu = by_class[DeviceClass::Cpu as usize].len(),
        gpu = by_class[DeviceClass::Gpu as usize].len(),
        accelerator = by_class[DeviceClass::Accelerator as usize].len(),
        host = by_class[DeviceClass::Host as usize].len(),
        "Device catalog populated"
    );

    CatalogSnapshot {
        platforms,
        by_class,
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{DevQueueError, Result};
    use crate::runtime::{NativeQueue, StaticRuntime};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn two_platforms() -> Vec<PlatformInfo> {
        vec![
            PlatformInfo::new("Host", "host")
                .with_device(DeviceInfo::new(DeviceClass::Cpu, "cpu0"))
                .with_device(DeviceInfo::new(DeviceClass::Host, "host0")),
            PlatformInfo::new("Sim", "sim")
                .with_device(DeviceInfo::new(DeviceClass::Gpu, "gpu0"))
                .with_device(DeviceInfo::new(DeviceClass::Cpu, "cpu1"))
                .with_device(DeviceInfo::new(DeviceClass::Gpu, "gpu1")),
        ]
    }

    #[test]
    fn test_counts() {
        let catalog = DeviceCatalog::new(Arc::new(StaticRuntime::new("t", two_platforms())));
        assert!(!catalog.is_populated());

        assert_eq!(catalog.count_platforms(), 2);
        assert_eq!(catalog.count_devices(DeviceClass::Cpu), 2);
        assert_eq!(catalog.count_devices(DeviceClass::Gpu), 2);
        assert_eq!(catalog.count_devices(DeviceClass::Accelerator), 0);
        assert_eq!(catalog.count_devices(DeviceClass::Host), 1);
        assert!(catalog.is_populated());
        assert_eq!(catalog.all_devices().count(), 5);
    }

    #[test]
    fn test_ordinals_span_platforms() {
        let catalog = DeviceCatalog::new(Arc::new(StaticRuntime::new("t", two_platforms())));

        let cpu1 = catalog.device(DeviceClass::Cpu, 1).unwrap();
        assert_eq!(cpu1.name, "cpu1");
        assert_eq!(cpu1.index, 1);
        assert_eq!(cpu1.platform_index, 1);

        let gpu1 = catalog.device(DeviceClass::Gpu, 1).unwrap();
        assert_eq!(gpu1.name, "gpu1");
        assert!(catalog.device(DeviceClass::Gpu, 2).is_none());
        assert_eq!(catalog.platform(1).unwrap().devices[2].index, 1);
    }

    #[test]
    fn test_empty_runtime() {
        let catalog = DeviceCatalog::new(Arc::new(StaticRuntime::empty()));
        assert_eq!(catalog.count_platforms(), 0);
        for class in DeviceClass::ALL {
            assert_eq!(catalog.count_devices(class), 0);
        }
        assert!(catalog.enumeration_error().is_none());
    }

    struct FailingRuntime {
        calls: AtomicUsize,
    }

    impl DeviceRuntime for FailingRuntime {
        fn name(&self) -> &str {
            "failing"
        }

        fn enumerate_platforms(&self) -> Result<Vec<PlatformInfo>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(DevQueueError::BackendUnavailable("no driver".to_string()))
        }

        fn create_queue(&self, _device: &DeviceInfo) -> Result<Arc<dyn NativeQueue>> {
            Err(DevQueueError::BackendUnavailable("no driver".to_string()))
        }
    }

    #[test]
    fn test_enumeration_failure_is_empty_and_not_retried() {
        let runtime = Arc::new(FailingRuntime {
            calls: AtomicUsize::new(0),
        });
        let catalog = DeviceCatalog::new(runtime.clone());

        assert_eq!(catalog.count_platforms(), 0);
        assert_eq!(catalog.count_platforms(), 0);
        assert_eq!(catalog.count_devices(DeviceClass::Gpu), 0);
        assert!(catalog.enumeration_error().unwrap().contains("no driver"));
        assert_eq!(runtime.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_concurrent_first_population() {
        let runtime = Arc::new(StaticRuntime::new("t", two_platforms()));
        let catalog = Arc::new(DeviceCatalog::new(runtime));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = Arc::clone(&catalog);
                std::thread::spawn(move || c.count_devices(DeviceClass::Gpu))
            })
            .collect();

        for h in handles {
            assert_eq!(h.join().unwrap(), 2);
        }
    }
}
