//! CLI command implementations.

pub mod check;
pub mod counts;
pub mod devices;
pub mod platforms;

use colored::{ColoredString, Colorize};

/// Label for a device class, colored by class.
pub fn class_label(class: devqueue::DeviceClass) -> ColoredString {
    use devqueue::DeviceClass;

    let label = format!("{:<11}", class.as_str());
    match class {
        DeviceClass::Cpu => label.bright_blue(),
        DeviceClass::Gpu => label.bright_green(),
        DeviceClass::Accelerator => label.bright_magenta(),
        DeviceClass::Host => label.dimmed(),
    }
}
