//! # devqueue C interface
//!
//! Flat, C-linkage functions over the process-wide queue manager
//! ([`devqueue::global`]). The declarations are in `include/devqueue.h`.
//!
//! ## Ownership
//!
//! - `DQQueue *` and `DQContext *` returned by this library are owned by the
//!   caller and must be released with `dq_delete_queue` and
//!   `dq_delete_context`.
//! - `const DQDevice *` returned by `dq_get_device_from_queue` is borrowed
//!   from its queue and valid until that queue is deleted.
//! - `dq_last_error` returns a string owned by the calling thread, valid until
//!   the next failing call on that thread.
//!
//! Failures return null or a non-zero [`DQStatus`] and record a message for
//! `dq_last_error`.

#![warn(missing_docs)]

use std::ffi::c_char;

use devqueue::{Context, DevQueueError, DeviceClass, DeviceInfo, Queue, QueueManager};

mod error;

pub use error::DQStatus;
use error::{clear_last_error, last_error_ptr, set_last_error};

/// Device class as seen from C.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DQDeviceClass {
    /// Host CPU.
    Cpu = 0,
    /// GPU.
    Gpu = 1,
    /// Other accelerator.
    Accelerator = 2,
    /// Host fallback device.
    Host = 3,
}

impl From<DQDeviceClass> for DeviceClass {
    fn from(class: DQDeviceClass) -> Self {
        match class {
            DQDeviceClass::Cpu => DeviceClass::Cpu,
            DQDeviceClass::Gpu => DeviceClass::Gpu,
            DQDeviceClass::Accelerator => DeviceClass::Accelerator,
            DQDeviceClass::Host => DeviceClass::Host,
        }
    }
}

/// Opaque queue handle.
pub struct DQQueue(Queue);

/// Opaque device description, borrowed from a queue.
#[repr(transparent)]
pub struct DQDevice(DeviceInfo);

/// Opaque context handle.
pub struct DQContext(Context);

/// Record the error of a failed call and map it to its status code.
fn checked<T>(result: devqueue::Result<T>) -> Result<T, DQStatus> {
    result.map_err(|e| set_last_error(&e))
}

fn manager() -> Result<&'static QueueManager, DQStatus> {
    checked(devqueue::global())
}

fn into_handle(result: devqueue::Result<Queue>) -> *mut DQQueue {
    match checked(result) {
        Ok(queue) => Box::into_raw(Box::new(DQQueue(queue))),
        Err(_) => std::ptr::null_mut(),
    }
}

fn invalid_handle(what: &str) -> DQStatus {
    set_last_error(&DevQueueError::InvalidHandle(format!("null {}", what)))
}

// ----------------------------------------------------------------------------
// Counts
// ----------------------------------------------------------------------------

/// Number of discovered platforms.
#[no_mangle]
pub extern "C" fn dq_count_platforms() -> usize {
    manager().map_or(0, |m| m.count_platforms())
}

/// Number of discovered devices of `class`.
#[no_mangle]
pub extern "C" fn dq_count_devices_of_class(class: DQDeviceClass) -> usize {
    manager().map_or(0, |m| m.count_devices(class.into()))
}

/// Number of CPU queues that can be requested.
#[no_mangle]
pub extern "C" fn dq_get_num_cpu_queues() -> usize {
    manager().map_or(0, |m| m.num_cpu_queues())
}

/// Number of GPU queues that can be requested.
#[no_mangle]
pub extern "C" fn dq_get_num_gpu_queues() -> usize {
    manager().map_or(0, |m| m.num_gpu_queues())
}

/// Number of queues activated on the calling thread.
#[no_mangle]
pub extern "C" fn dq_get_num_activated_queues() -> usize {
    manager().map_or(0, |m| m.activated_count())
}

// ----------------------------------------------------------------------------
// Queues
// ----------------------------------------------------------------------------

/// Queue of device `index` of `class`. Null on error.
#[no_mangle]
pub extern "C" fn dq_get_queue(class: DQDeviceClass, index: usize) -> *mut DQQueue {
    match manager() {
        Ok(m) => into_handle(m.get_queue(class.into(), index)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// The calling thread's current queue. Null on error.
#[no_mangle]
pub extern "C" fn dq_get_current_queue() -> *mut DQQueue {
    match manager() {
        Ok(m) => into_handle(m.current_queue()),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Activate the queue of device `index` of `class` on the calling thread and
/// return a handle to it. Null on error, in which case nothing is activated.
#[no_mangle]
pub extern "C" fn dq_push_queue(class: DQDeviceClass, index: usize) -> *mut DQQueue {
    match manager() {
        Ok(m) => into_handle(m.push_queue(class.into(), index)),
        Err(_) => std::ptr::null_mut(),
    }
}

/// Deactivate the calling thread's current queue.
#[no_mangle]
pub extern "C" fn dq_pop_queue() -> DQStatus {
    match manager().and_then(|m| checked(m.pop_queue())) {
        Ok(()) => DQStatus::Ok,
        Err(status) => status,
    }
}

/// Release a queue handle. Null is ignored.
///
/// # Safety
///
/// `queue` must be null or a handle returned by this library that was not
/// deleted yet.
#[no_mangle]
pub unsafe extern "C" fn dq_delete_queue(queue: *mut DQQueue) {
    if queue.is_null() {
        return;
    }
    let handle = Box::from_raw(queue);
    if let Some(m) = devqueue::try_global() {
        m.delete_queue(handle.0);
    }
}

/// Device of `queue`, borrowed from it. Null when `queue` is null.
///
/// # Safety
///
/// `queue` must be null or a live queue handle.
#[no_mangle]
pub unsafe extern "C" fn dq_get_device_from_queue(queue: *const DQQueue) -> *const DQDevice {
    match queue.as_ref() {
        Some(handle) => (handle.0.device() as *const DeviceInfo).cast::<DQDevice>(),
        None => {
            invalid_handle("queue");
            std::ptr::null()
        }
    }
}

/// Context of `queue`, owned by the caller. Null when `queue` is null.
///
/// # Safety
///
/// `queue` must be null or a live queue handle.
#[no_mangle]
pub unsafe extern "C" fn dq_get_context_from_queue(queue: *const DQQueue) -> *mut DQContext {
    match queue.as_ref() {
        Some(handle) => Box::into_raw(Box::new(DQContext(handle.0.context().clone()))),
        None => {
            invalid_handle("queue");
            std::ptr::null_mut()
        }
    }
}

/// Wait for work submitted to `queue`.
///
/// # Safety
///
/// `queue` must be null or a live queue handle.
#[no_mangle]
pub unsafe extern "C" fn dq_wait_queue(queue: *const DQQueue) -> DQStatus {
    let Some(handle) = queue.as_ref() else {
        return invalid_handle("queue");
    };
    match checked(handle.0.wait()) {
        Ok(()) => DQStatus::Ok,
        Err(status) => status,
    }
}

// ----------------------------------------------------------------------------
// Contexts
// ----------------------------------------------------------------------------

/// True when `context` belongs to the host fallback device.
///
/// # Safety
///
/// `context` must be null or a live context handle.
#[no_mangle]
pub unsafe extern "C" fn dq_is_host_context(context: *const DQContext) -> bool {
    match context.as_ref() {
        Some(handle) => handle.0.is_host(),
        None => {
            invalid_handle("context");
            false
        }
    }
}

/// Release a context handle. Null is ignored.
///
/// # Safety
///
/// `context` must be null or a handle returned by this library that was not
/// deleted yet.
#[no_mangle]
pub unsafe extern "C" fn dq_delete_context(context: *mut DQContext) {
    if !context.is_null() {
        drop(Box::from_raw(context));
    }
}

// ----------------------------------------------------------------------------
// Diagnostics
// ----------------------------------------------------------------------------

/// Print every platform and its devices to stderr.
#[no_mangle]
pub extern "C" fn dq_dump_platform_info() {
    if let Ok(m) = manager() {
        m.dump_platform_info();
    }
}

/// Print `device` to stderr. Null is reported through `dq_last_error`.
///
/// # Safety
///
/// `device` must be null or a pointer from `dq_get_device_from_queue` whose
/// queue is still live.
#[no_mangle]
pub unsafe extern "C" fn dq_dump_device_info(device: *const DQDevice) {
    let Some(device) = device.as_ref() else {
        invalid_handle("device");
        return;
    };
    if let Ok(m) = manager() {
        m.dump_device_info(&device.0);
    }
}

/// Message of the calling thread's last failure, or null.
#[no_mangle]
pub extern "C" fn dq_last_error() -> *const c_char {
    last_error_ptr()
}

/// Forget the calling thread's last failure.
#[no_mangle]
pub extern "C" fn dq_clear_last_error() {
    clear_last_error();
}
