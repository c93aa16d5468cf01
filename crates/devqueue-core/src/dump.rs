//! Human-readable platform and device reports.

use std::fmt::Write;

use crate::device::{DeviceClass, DeviceInfo, PlatformInfo};

const MIB: u64 = 1024 * 1024;

/// Render every platform and the devices it exposes.
pub fn platform_report(platforms: &[PlatformInfo]) -> String {
    let mut out = String::new();
    if platforms.is_empty() {
        out.push_str("No platforms found.\n");
        return out;
    }

    for platform in platforms {
        let _ = writeln!(out, "---Platform {}", platform.index);
        field(&mut out, 4, "Name", &platform.name);
        field(&mut out, 4, "Vendor", &platform.vendor);
        field(&mut out, 4, "Version", &platform.version);
        field(&mut out, 4, "Backend", &platform.backend);
        field(&mut out, 4, "Devices", &platform.devices.len().to_string());
        for (i, device) in platform.devices.iter().enumerate() {
            let _ = writeln!(
                out,
                "        # {:<4}{} {} ({})",
                i, device.class, device.index, device.name
            );
        }
    }
    out
}

/// Render one device.
pub fn device_report(device: &DeviceInfo) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "---Device {}", device.key());
    field(&mut out, 4, "Name", &device.name);
    field(&mut out, 4, "Vendor", &device.vendor);
    field(&mut out, 4, "Driver", &device.driver_version);
    field(&mut out, 4, "Class", device.class.as_str());
    field(&mut out, 4, "Platform", &device.platform_index.to_string());
    field(
        &mut out,
        4,
        "Compute units",
        &device.max_compute_units.to_string(),
    );
    field(
        &mut out,
        4,
        "Work-group size",
        &device.max_work_group_size.to_string(),
    );
    field(
        &mut out,
        4,
        "Global memory",
        &format!("{} MiB", device.global_memory / MIB),
    );
    field(
        &mut out,
        4,
        "Host device",
        if device.class == DeviceClass::Host {
            "yes"
        } else {
            "no"
        },
    );
    out
}

fn field(out: &mut String, indent: usize, name: &str, value: &str) {
    let value = if value.is_empty() { "-" } else { value };
    let _ = writeln!(out, "{:indent$}{:<16}{}", "", name, value, indent = indent);
}
