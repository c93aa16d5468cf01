//! `devqueue devices` command - List devices, optionally of one class.

use colored::Colorize;
use devqueue::{DeviceClass, DeviceInfo, QueueManager};

use super::class_label;
use crate::error::CliResult;

const MIB: u64 = 1024 * 1024;

/// Devices to list, in catalog order.
pub fn select(manager: &QueueManager, class: Option<DeviceClass>) -> Vec<&DeviceInfo> {
    match class {
        Some(class) => manager.catalog().devices(class).iter().collect(),
        None => manager.catalog().all_devices().collect(),
    }
}

/// Execute the `devices` command.
pub fn execute(manager: &QueueManager, class: Option<DeviceClass>, detailed: bool) -> CliResult<()> {
    let devices = select(manager, class);

    if devices.is_empty() {
        match class {
            Some(class) => println!("No {} devices found.", class),
            None => println!("No devices found."),
        }
        return Ok(());
    }

    for device in devices {
        if detailed {
            print!("{}", manager.device_info(device));
            continue;
        }
        println!(
            "  {} {:>2}  {} {}",
            class_label(device.class),
            device.index,
            device.name.bright_white(),
            format!(
                "(platform {}, {} CU, {} MiB)",
                device.platform_index,
                device.max_compute_units,
                device.global_memory / MIB
            )
            .dimmed()
        );
    }
    Ok(())
}
