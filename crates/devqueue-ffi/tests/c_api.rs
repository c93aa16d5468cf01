//! Tests of the C interface, called from Rust.

use std::ffi::CStr;
use std::thread;

use devqueue::{ConfigBuilder, DevQueueError};
use devqueue_ffi::*;

fn ensure_init() {
    let config = ConfigBuilder::new()
        .simulated_gpus(1)
        .build()
        .expect("Failed to build config");
    match devqueue::init_global(&config) {
        Ok(_) | Err(DevQueueError::AlreadyInitialized) => {}
        Err(e) => panic!("Failed to initialize global manager: {}", e),
    }
}

fn last_error() -> String {
    let ptr = dq_last_error();
    assert!(!ptr.is_null());
    unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned()
}

#[test]
fn test_counts() {
    ensure_init();
    assert_eq!(dq_count_platforms(), 2);
    assert_eq!(dq_count_platforms(), 2);
    assert_eq!(dq_get_num_cpu_queues(), 1);
    assert_eq!(dq_get_num_gpu_queues(), 1);
    assert_eq!(dq_count_devices_of_class(DQDeviceClass::Host), 1);
    assert_eq!(dq_count_devices_of_class(DQDeviceClass::Accelerator), 0);
}

#[test]
fn test_push_pop_across_threads() {
    ensure_init();

    let main_queue = dq_push_queue(DQDeviceClass::Cpu, 0);
    assert!(!main_queue.is_null());
    assert_eq!(dq_get_num_activated_queues(), 1);

    let a = thread::spawn(|| {
        let cpu = dq_push_queue(DQDeviceClass::Cpu, 0);
        let gpu = dq_push_queue(DQDeviceClass::Gpu, 0);
        let count = dq_get_num_activated_queues();
        assert_eq!(dq_pop_queue(), DQStatus::Ok);
        assert_eq!(dq_pop_queue(), DQStatus::Ok);
        unsafe {
            dq_delete_queue(gpu);
            dq_delete_queue(cpu);
        }
        count
    });
    let b = thread::spawn(|| {
        let gpu = dq_push_queue(DQDeviceClass::Gpu, 0);
        let count = dq_get_num_activated_queues();
        assert_eq!(dq_pop_queue(), DQStatus::Ok);
        unsafe { dq_delete_queue(gpu) };
        count
    });

    assert_eq!(a.join().unwrap(), 2);
    assert_eq!(b.join().unwrap(), 1);
    assert_eq!(dq_get_num_activated_queues(), 1);

    assert_eq!(dq_pop_queue(), DQStatus::Ok);
    assert_eq!(dq_get_num_activated_queues(), 0);
    unsafe { dq_delete_queue(main_queue) };
}

#[test]
fn test_out_of_range() {
    ensure_init();

    assert!(dq_get_queue(DQDeviceClass::Gpu, 5).is_null());
    assert!(last_error().contains("out of range"));

    assert!(dq_push_queue(DQDeviceClass::Accelerator, 0).is_null());
    assert_eq!(dq_get_num_activated_queues(), 0);
}

#[test]
fn test_pop_empty() {
    ensure_init();
    dq_clear_last_error();

    assert_eq!(dq_pop_queue(), DQStatus::EmptyStack);
    assert_eq!(last_error(), "active queue stack is empty");
}

#[test]
fn test_current_queue_follows_stack() {
    ensure_init();

    let gpu = dq_push_queue(DQDeviceClass::Gpu, 0);
    let current = dq_get_current_queue();
    assert!(!current.is_null());

    unsafe {
        let device = dq_get_device_from_queue(current);
        assert!(!device.is_null());
        dq_dump_device_info(device);

        let context = dq_get_context_from_queue(current);
        assert!(!dq_is_host_context(context));
        dq_delete_context(context);

        assert_eq!(dq_wait_queue(current), DQStatus::Ok);
        dq_delete_queue(current);
    }

    assert_eq!(dq_pop_queue(), DQStatus::Ok);
    unsafe { dq_delete_queue(gpu) };
}

#[test]
fn test_default_queue_on_fresh_thread() {
    ensure_init();

    thread::spawn(|| {
        assert_eq!(dq_get_num_activated_queues(), 0);
        let queue = dq_get_current_queue();
        assert!(!queue.is_null());

        unsafe {
            let device = dq_get_device_from_queue(queue);
            assert!(!device.is_null());
            dq_dump_device_info(device);

            let context = dq_get_context_from_queue(queue);
            assert!(!context.is_null());
            assert!(!dq_is_host_context(context));
            dq_delete_context(context);

            dq_delete_queue(queue);
        }
        assert_eq!(dq_get_num_activated_queues(), 0);
        assert_eq!(dq_pop_queue(), DQStatus::EmptyStack);
    })
    .join()
    .expect("Failed to join thread");
}

#[test]
fn test_host_context() {
    ensure_init();

    let host = dq_get_queue(DQDeviceClass::Host, 0);
    assert!(!host.is_null());
    unsafe {
        let context = dq_get_context_from_queue(host);
        assert!(dq_is_host_context(context));
        dq_delete_context(context);
        dq_delete_queue(host);
    }
}

#[test]
fn test_null_handles() {
    ensure_init();

    unsafe {
        dq_delete_queue(std::ptr::null_mut());
        dq_delete_context(std::ptr::null_mut());

        assert!(dq_get_device_from_queue(std::ptr::null()).is_null());
        assert!(last_error().contains("invalid handle"));

        assert!(dq_get_context_from_queue(std::ptr::null()).is_null());
        assert!(!dq_is_host_context(std::ptr::null()));
        assert_eq!(dq_wait_queue(std::ptr::null()), DQStatus::InvalidHandle);
        dq_dump_device_info(std::ptr::null());
    }
    dq_dump_platform_info();
}
